//! Parsing Options.
//! `lupa [options] <PROGRAM>`, where PROGRAM is the JSON description of the
//! program to analyze.

use clap::{Arg, ArgAction, Command};
use std::error::Error;

/// Where lock identity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasMode {
    /// Values with the same name in the same scope.
    #[default]
    Name,
    /// Every lock is the same lock.
    All,
    /// Alias sets read from `--alias-file`.
    File,
}

fn make_options_parser() -> clap::Command {
    Command::new("lupa")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Classifies lock usage patterns of a program")
        .arg(
            Arg::new("input")
                .value_name("PROGRAM")
                .help("JSON description of the program to analyze")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration; defaults apply when the file is missing")
                .default_value("lupa.toml"),
        )
        .arg(
            Arg::new("alias")
                .short('a')
                .long("alias")
                .help("How lock operands are identified")
                .default_value("name")
                .value_parser(["name", "all", "file"]),
        )
        .arg(
            Arg::new("alias-file")
                .long("alias-file")
                .value_name("FILE")
                .help("Alias sets, implies `--alias file`"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the report will be stored, JSON goes to FILE.json"),
        )
        .arg(
            Arg::new("viz-callgraph")
                .long("viz-callgraph")
                .value_name("FILE")
                .help("Write the call graph in DOT format"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Do not print the report"),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub input: String,
    pub config: String,
    pub alias_mode: AliasMode,
    pub alias_file: Option<String>,
    pub output: Option<String>,
    pub viz_callgraph: Option<String>,
    pub quiet: bool,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let alias_file = matches.get_one::<String>("alias-file").cloned();
        let alias_mode = match matches.get_one::<String>("alias").map(String::as_str) {
            _ if alias_file.is_some() => AliasMode::File,
            Some("name") => AliasMode::Name,
            Some("all") => AliasMode::All,
            Some("file") => return Err("`--alias file` requires `--alias-file`")?,
            _ => return Err("UnsupportedAliasMode")?,
        };

        let input = matches
            .get_one::<String>("input")
            .cloned()
            .ok_or("missing program")?;
        let config = matches
            .get_one::<String>("config")
            .cloned()
            .unwrap_or_default();

        Ok(Options {
            input,
            config,
            alias_mode,
            alias_file,
            output: matches.get_one::<String>("output").cloned(),
            viz_callgraph: matches.get_one::<String>("viz-callgraph").cloned(),
            quiet: matches.get_flag("quiet"),
        })
    }
}
