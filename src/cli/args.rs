//! CLI argument parsing.
//!
//! Numeric arguments are kept as text here and evaluated by the command
//! handlers, so rates may be written as ratios (`1/6`) and bad values are
//! reported with the parameter name (`μ: must be a positive number`).

use std::path::PathBuf;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Debug-level logging.
    pub verbose: bool,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// M/M/c/K steady state
    Mm {
        /// μ per server.
        service_rate: String,
        /// λ.
        arrival_rate: String,
        /// c.
        servers: String,
        /// K (absent = infinite).
        capacity: Option<String>,
    },
    /// D/D/1/K deterministic queue
    Dd1k {
        /// λ.
        arrival_rate: String,
        /// μ.
        service_rate: String,
        /// K.
        capacity: String,
        /// M (λ < μ only).
        initial_customers: Option<String>,
        /// Print the event trace.
        timeline: bool,
    },
    /// Rational approximation of a decimal
    Fraction {
        /// The decimal to approximate.
        decimal: String,
    },
    /// Run every scenario in a YAML file
    Run {
        /// Path to the scenario file.
        scenario_path: PathBuf,
    },
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// This method is testable as it accepts any iterator of strings,
    /// not just `std::env::args()`.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    /// Internal parsing from a vector of strings.
    fn parse_from_vec(args: &[String]) -> Self {
        let mut json = false;
        let mut verbose = false;
        let mut rest = Vec::with_capacity(args.len());
        for arg in args.iter().skip(1) {
            match arg.as_str() {
                "--json" => json = true,
                "-v" | "--verbose" => verbose = true,
                _ => rest.push(arg.clone()),
            }
        }

        let command = match rest.first().map(String::as_str) {
            None => Command::Help,
            Some("mm") => Self::parse_mm_command(&rest),
            Some("dd1k") => Self::parse_dd1k_command(&rest),
            Some("fraction") => Self::parse_fraction_command(&rest),
            Some("run") => Self::parse_run_command(&rest),
            Some("-h" | "--help" | "help") => Command::Help,
            Some("-V" | "--version" | "version") => Command::Version,
            Some(unknown) => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self {
            command,
            json,
            verbose,
        }
    }

    /// Split `args[1..]` into positionals and the value of each `--flag <value>`.
    fn split_options<'a>(
        args: &'a [String],
        valued: &[&str],
    ) -> (Vec<&'a str>, Vec<(&'a str, Option<&'a str>)>) {
        let mut positionals = Vec::new();
        let mut options = Vec::new();
        let mut i = 1;
        while i < args.len() {
            let arg = args[i].as_str();
            if valued.contains(&arg) {
                options.push((arg, args.get(i + 1).map(String::as_str)));
                i += 2;
            } else if arg.starts_with("--") {
                options.push((arg, None));
                i += 1;
            } else {
                positionals.push(arg);
                i += 1;
            }
        }
        (positionals, options)
    }

    fn option_value(options: &[(&str, Option<&str>)], names: &[&str]) -> Option<String> {
        options
            .iter()
            .rev()
            .find(|(name, _)| names.contains(name))
            .and_then(|(_, value)| value.map(str::to_string))
    }

    /// Parse the 'mm' command arguments.
    fn parse_mm_command(args: &[String]) -> Command {
        let (positionals, options) = Self::split_options(args, &["--capacity", "-k"]);
        if positionals.len() < 3 {
            eprintln!("Error: 'mm' command requires <μ> <λ> <c>");
            return Command::Help;
        }

        Command::Mm {
            service_rate: positionals[0].to_string(),
            arrival_rate: positionals[1].to_string(),
            servers: positionals[2].to_string(),
            capacity: Self::option_value(&options, &["--capacity", "-k"]),
        }
    }

    /// Parse the 'dd1k' command arguments.
    fn parse_dd1k_command(args: &[String]) -> Command {
        let (positionals, options) = Self::split_options(args, &["--initial", "-m"]);
        if positionals.len() < 3 {
            eprintln!("Error: 'dd1k' command requires <λ> <μ> <K>");
            return Command::Help;
        }

        Command::Dd1k {
            arrival_rate: positionals[0].to_string(),
            service_rate: positionals[1].to_string(),
            capacity: positionals[2].to_string(),
            initial_customers: Self::option_value(&options, &["--initial", "-m"]),
            timeline: options.iter().any(|(name, _)| *name == "--timeline"),
        }
    }

    /// Parse the 'fraction' command arguments.
    fn parse_fraction_command(args: &[String]) -> Command {
        if args.len() < 2 {
            eprintln!("Error: 'fraction' command requires a decimal");
            return Command::Help;
        }

        Command::Fraction {
            decimal: args[1].clone(),
        }
    }

    /// Parse the 'run' command arguments.
    fn parse_run_command(args: &[String]) -> Command {
        if args.len() < 2 {
            eprintln!("Error: 'run' command requires scenario path");
            return Command::Help;
        }

        Command::Run {
            scenario_path: PathBuf::from(&args[1]),
        }
    }
}
