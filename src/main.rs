//! Wraith Prism CLI tool.

use std::error::Error;
use std::io::{self, Write};
use std::process;
use std::str::FromStr;

use clap::builder::EnumValueParser;
use clap::{
    crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command, ValueEnum,
};
use env_logger::Env;

use wraith_prism::protocol::{UDEV_RULE, UDEV_RULE_PATH};
use wraith_prism::{
    morse, Brightness, ComponentKind, HidConfig, HidTransport, LedState, LightingMode,
    MirageState, Rgb, RotationDirection, Speed, WraithPrism,
};

/// LED zone.
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
enum Zone {
    #[default]
    Logo,
    Fan,
    Ring,
}

impl Zone {
    fn kind(self) -> ComponentKind {
        match self {
            Self::Logo => ComponentKind::Logo,
            Self::Fan => ComponentKind::Fan,
            Self::Ring => ComponentKind::Ring,
        }
    }
}

/// Requested component changes.
#[derive(Default)]
struct Config {
    zone: Zone,
    mode: Option<String>,
    color: Option<Rgb>,
    speed: Option<Speed>,
    brightness: Option<Brightness>,
    random_color: Option<bool>,
    direction: Option<RotationDirection>,
    text: Option<String>,
    save: bool,
}

impl Config {
    fn from_cli(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let mut config = Config::default();

        if let Some(zone) = matches.get_one::<Zone>("zone") {
            config.zone = *zone;
        }

        config.mode = matches.get_one::<String>("mode").cloned();
        config.text = matches.get_one::<String>("text").cloned();
        config.color = cli_from_str(matches, "color")?;
        config.speed = cli_from_str(matches, "speed")?;
        config.brightness = cli_from_str(matches, "brightness")?;
        config.direction = cli_from_str(matches, "direction")?;

        if matches.get_flag("random") {
            config.random_color = Some(true);
        } else if matches.get_flag("fixed") {
            config.random_color = Some(false);
        }

        config.save = matches.get_flag("save");

        Ok(config)
    }

    /// Update the settings shared by all zones.
    fn apply<M>(&self, state: &mut LedState<M>) -> Result<(), Box<dyn Error>>
    where
        M: LightingMode + FromStr<Err = String>,
    {
        if let Some(mode) = &self.mode {
            state.mode = mode.parse()?;
        }
        if let Some(color) = self.color {
            state.color = color;
        }
        if let Some(speed) = self.speed {
            state.speed = speed;
        }
        if let Some(brightness) = self.brightness {
            state.brightness = brightness;
        }
        if let Some(random_color) = self.random_color {
            state.random_color = random_color;
        }

        Ok(())
    }
}

fn main() {
    let matches = cli();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(err) = run(&matches) {
        eprintln!("\x1b[31mError:\x1b[0m {err}");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    if matches.subcommand_matches("udev-rule").is_some() {
        println!("# {UDEV_RULE_PATH}\n{UDEV_RULE}");
        return Ok(());
    }

    let mut prism = WraithPrism::open(&HidConfig::default())?;

    match matches.subcommand() {
        Some(("set", matches)) => set(&mut prism, &Config::from_cli(matches)?)?,
        Some(("mirage", matches)) => mirage(&mut prism, matches)?,
        Some(("enso", matches)) => {
            let enabled = matches.get_one::<String>("state").map_or(false, |state| state == "on");
            prism.set_enso(enabled)?;
        },
        Some(("reset", matches)) => reset(&mut prism, matches)?,
        Some(("save", _)) => prism.save()?,
        _ => info(&mut prism)?,
    }

    prism.close();

    Ok(())
}

/// Print the current device state.
fn info(prism: &mut WraithPrism<HidTransport>) -> Result<(), Box<dyn Error>> {
    println!("Firmware: {}", prism.firmware_version()?);
    println!("Enso:     {}", if prism.enso()? { "on" } else { "off" });

    for (name, state) in [("Logo", &prism.logo().state), ("Fan", &prism.fan().state)] {
        print_state(name, state);
    }

    let ring = prism.ring();
    print_state("Ring", &ring.state);
    if ring.state.mode.supports_direction() {
        println!("  direction:  {}", ring.direction);
    }
    println!("  text:       {:?}", ring.morse_text());

    Ok(())
}

fn print_state<M: LightingMode + std::fmt::Display>(name: &str, state: &LedState<M>) {
    let color = if state.random_color { "random".into() } else { state.color.to_string() };

    println!("{name}:");
    println!("  mode:       {}", state.mode);
    println!("  color:      {color}");
    println!("  speed:      {}", state.speed);
    println!("  brightness: {}", state.brightness);
}

/// Update a single zone.
fn set(prism: &mut WraithPrism<HidTransport>, config: &Config) -> Result<(), Box<dyn Error>> {
    match config.zone {
        Zone::Logo => config.apply(&mut prism.logo_mut().state)?,
        Zone::Fan => config.apply(&mut prism.fan_mut().state)?,
        Zone::Ring => {
            let ring = prism.ring_mut();
            config.apply(&mut ring.state)?;

            if let Some(direction) = config.direction {
                ring.direction = direction;
            }

            if let Some(text) = &config.text {
                let invalid = morse::invalid_characters(text);
                if !morse::is_morse_code(text) && !invalid.is_empty() {
                    return Err(format!("unsupported morse characters: {invalid}").into());
                }
                ring.set_morse_text(text.as_str());
            }
        },
    }

    let kind = config.zone.kind();
    prism.submit_component(kind)?;

    if config.save {
        prism.save()?;
    } else if prism.component(kind).is_dirty() {
        println!("Changes will be lost on power loss, use --save to persist them.");
    }

    println!("\x1b[32mSuccessfully applied changes.\x1b[0m");

    Ok(())
}

/// Update the fan's mirage effect.
fn mirage(
    prism: &mut WraithPrism<HidTransport>,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let values: Vec<&String> =
        matches.get_many::<String>("frequencies").into_iter().flatten().collect();

    let state = match values.as_slice() {
        [off] if off.as_str() == "off" => MirageState::Off,
        [red, green, blue] => {
            MirageState::On { red: red.parse()?, green: green.parse()?, blue: blue.parse()? }
        },
        _ => return Err("expected 'off' or three frequencies in Hz".into()),
    };

    prism.set_fan_mirage(state);
    prism.push_fan_mirage_state()?;

    Ok(())
}

/// Reset all zones to their factory effects.
fn reset(
    prism: &mut WraithPrism<HidTransport>,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    if !matches.get_flag("yes") {
        println!("Are you sure you want to reset all LED zones?");
        println!("\x1b[31mThis will overwrite your current configuration\x1b[0m.");
        print!(" [y/N] > ");
        let _ = io::stdout().flush();

        // Abort unless the user agrees to reset their config.
        if stdin_nextline().to_lowercase() != "y" {
            println!("Bailing out.");
            return Ok(());
        }
    }

    prism.reset_to_default()?;
    prism.save()?;

    println!("\x1b[32mSuccessfully reset all zones.\x1b[0m");

    Ok(())
}

/// Get clap CLI parameters.
fn cli() -> ArgMatches {
    Command::new(crate_name!())
        .version(crate_version!())
        .author("Christian Duerr <contact@christianduerr.com>")
        .about(crate_description!())
        .arg(
            Arg::new("verbose")
                .help("Increase log verbosity")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count),
        )
        .subcommand(Command::new("info").about("Print the current LED configuration"))
        .subcommand(
            Command::new("set")
                .about("Change the configuration of an LED zone")
                .arg(
                    Arg::new("zone")
                        .help("LED zone")
                        .required(true)
                        .ignore_case(true)
                        .value_parser(EnumValueParser::<Zone>::new()),
                )
                .arg(Arg::new("mode").help("Lighting effect").long("mode").short('m'))
                .arg(
                    Arg::new("color")
                        .help("LED color in RGB [0xRRGGBB]")
                        .long("color")
                        .short('c'),
                )
                .arg(
                    Arg::new("speed")
                        .help("Effect speed [slowest, slow, medium, fast, fastest]")
                        .long("speed")
                        .short('s'),
                )
                .arg(
                    Arg::new("brightness")
                        .help("LED brightness [possible values: low, medium, high]")
                        .long("brightness")
                        .short('b'),
                )
                .arg(
                    Arg::new("random")
                        .help("Use random colors")
                        .long("random")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("fixed"),
                )
                .arg(
                    Arg::new("fixed")
                        .help("Use the configured color")
                        .long("fixed")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("direction")
                        .help("Ring rotation [possible values: clockwise, counter-clockwise]")
                        .long("direction")
                        .short('d'),
                )
                .arg(Arg::new("text").help("Ring morse text").long("text").short('t'))
                .arg(
                    Arg::new("save")
                        .help("Persist the configuration to flash")
                        .long("save")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("mirage").about("Change the fan's mirage effect").arg(
                Arg::new("frequencies")
                    .help("'off' or red, green and blue frequency in Hz")
                    .required(true)
                    .num_args(1..=3),
            ),
        )
        .subcommand(
            Command::new("enso")
                .about("Toggle enso mode")
                .arg(Arg::new("state").required(true).value_parser(["on", "off"])),
        )
        .subcommand(
            Command::new("reset").about("Reset all LED zones to their defaults").arg(
                Arg::new("yes")
                    .help("Skip confirmation")
                    .long("yes")
                    .short('y')
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(Command::new("save").about("Persist the current configuration to flash"))
        .subcommand(
            Command::new("udev-rule").about("Print the udev rule for unprivileged access"),
        )
        .get_matches()
}

/// Convert a CLI option from the parameter string.
fn cli_from_str<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, String> {
    match matches.get_one::<String>(name) {
        Some(value) => match T::from_str(value) {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(format!("invalid value '{value}' for '--{name}'")),
        },
        None => Ok(None),
    }
}

/// Read next line from STDIN.
#[inline]
fn stdin_nextline() -> String {
    let mut input = String::new();

    let _ = io::stdin().read_line(&mut input);
    input = input.trim().to_string();

    input
}
