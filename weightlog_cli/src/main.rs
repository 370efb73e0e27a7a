use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use weightlog_core::command::error_reply;
use weightlog_core::*;

#[derive(Parser)]
#[command(name = "wlog")]
#[command(about = "Food, exercise and weight ledger with energy-balance projection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// User id to act for (defaults to user.default_id from config)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pin today's date, YYYY-MM-DD (for testing)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or replace the user's profile
    Setup {
        age: u32,
        /// M or F
        sex: String,
        /// Height in cm
        height: u32,
        /// Starting weight in kg
        initial_weight: u32,
        /// Goal weight in kg
        target_weight: u32,
    },

    /// Record today's measured weight (kg)
    LogWeight {
        #[arg(allow_negative_numbers = true)]
        weight: i32,
    },

    /// Record something eaten today
    LogFood {
        tag: String,
        #[arg(allow_negative_numbers = true)]
        kcal: i32,
    },

    /// Record exercise done today
    LogExercise { tag: String, minutes: u32 },

    /// Theoretical vs. actual weight since setup
    History,

    /// Projected weight for the coming days
    Projection,

    /// Current theoretical weight
    TheoreticalWeight,

    /// Read `<user-id> <command> [args]` lines from stdin, reply on stdout
    Serve,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    weightlog_core::logging::init_with_level(&config.logging.level);

    let result = match cli.today {
        Some(date) => run(cli, config, FixedClock::at_date(date)),
        None => run(cli, config, SystemClock),
    };

    result.unwrap_or_else(|e| {
        eprintln!("{}", e);
        ExitCode::FAILURE
    })
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => {
            let config = Config::load()?;
            config.validate()?;
            Ok(config)
        }
    }
}

fn run<C: Clock>(cli: Cli, config: Config, clock: C) -> Result<ExitCode> {
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonFileStore::new(&data_dir);
    let tracker = Tracker::with_model(store, clock, config.model.clone());

    let command = match cli.command {
        Commands::Serve => {
            cmd_serve(&tracker)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Setup {
            age,
            sex,
            height,
            initial_weight,
            target_weight,
        } => match sex.parse() {
            Ok(sex) => Command::Setup(SetupRequest {
                age,
                sex,
                height_cm: height,
                initial_weight_kg: initial_weight,
                target_weight_kg: target_weight,
            }),
            Err(e) => return Ok(report_failure(&e)),
        },
        Commands::LogWeight { weight } => Command::LogWeight { weight_kg: weight },
        Commands::LogFood { tag, kcal } => Command::LogFood { tag, kcal },
        Commands::LogExercise { tag, minutes } => Command::LogExercise { tag, minutes },
        Commands::History => Command::History,
        Commands::Projection => Command::Projection,
        Commands::TheoreticalWeight => Command::TheoreticalWeight,
    };

    let Some(user_id) = cli.user.or_else(|| config.user.default_id.clone()) else {
        eprintln!("No user given. Pass --user or set user.default_id in the config file.");
        return Ok(ExitCode::FAILURE);
    };

    match execute(&tracker, &user_id, command) {
        Ok(reply) => {
            println!("{}", reply);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}

fn report_failure(err: &Error) -> ExitCode {
    if !err.is_expected() {
        tracing::error!("{}", err);
    }
    eprintln!("{}", error_reply(err));
    ExitCode::FAILURE
}

fn cmd_serve<S: UserStore, C: Clock>(tracker: &Tracker<S, C>) -> Result<()> {
    tracing::info!("Serving commands from stdin");

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut buf = Vec::new();
    let mut handled = 0usize;

    loop {
        buf.clear();
        if stdin.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        // Undecodable bytes must not end the loop for everyone else
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match line.split_once(char::is_whitespace) {
            Some((user_id, text)) => respond(tracker, user_id, text),
            None => "Expected: <user-id> <command> [args]".to_string(),
        };

        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
        handled += 1;
    }

    tracing::info!("Input closed after {} commands", handled);
    Ok(())
}
