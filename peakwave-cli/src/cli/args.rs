//! CLI argument definitions for `peakwave-cli`.

use clap::{Arg, ArgAction, Command};

fn input_arg() -> Arg {
    Arg::new("INPUT")
        .help("Path of the audio file (wav, mp3, m4a/aac)")
        .required(true)
        .index(1)
}

fn settings_arg() -> Arg {
    Arg::new("settings")
        .long("settings")
        .value_name("PATH")
        .help("JSON file with session settings; flags override its values")
}

fn bits_arg() -> Arg {
    Arg::new("bits")
        .long("bits")
        .short('b')
        .value_name("BITS")
        .value_parser(["8", "16", "32"])
        .help("Peak resolution in bits")
}

fn stereo_arg() -> Arg {
    Arg::new("stereo")
        .long("stereo")
        .action(ArgAction::SetTrue)
        .help("Keep one peak array per channel instead of a mono downmix")
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("Peakwave")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Draw and play audio waveforms in the terminal")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Play a file with a live waveform and progress cursor")
                .arg(input_arg())
                .arg(settings_arg())
                .arg(bits_arg())
                .arg(stereo_arg())
                .arg(
                    Arg::new("rate-adjustable")
                        .long("rate-adjustable")
                        .short('r')
                        .action(ArgAction::SetTrue)
                        .help("Use the media backend so the playback rate can change"),
                )
                .arg(
                    Arg::new("GAIN")
                        .long("gain")
                        .short('g')
                        .value_name("GAIN")
                        .value_parser(clap::value_parser!(f32))
                        .help("Playback gain between 0 and 100"),
                )
                .arg(
                    Arg::new("rate")
                        .long("rate")
                        .value_name("RATE")
                        .value_parser(clap::value_parser!(f32))
                        .help("Initial playback rate (rate-adjustable backend only)"),
                )
                .arg(
                    Arg::new("seek")
                        .long("seek")
                        .short('s')
                        .value_name("TIME")
                        .value_parser(clap::value_parser!(f64))
                        .help("Start at the given time in seconds"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Play without drawing the terminal UI"),
                ),
        )
        .subcommand(
            Command::new("peaks")
                .about("Output waveform peaks as JSON")
                .arg(input_arg())
                .arg(settings_arg())
                .arg(bits_arg())
                .arg(stereo_arg())
                .arg(
                    Arg::new("width")
                        .long("width")
                        .short('w')
                        .value_name("PIXELS")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("800")
                        .help("Number of pixel columns to summarize the file into"),
                ),
        )
}
