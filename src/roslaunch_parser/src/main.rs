//! roslaunch_parser CLI

use clap::{Parser, Subcommand};
use roslaunch_parser::{
    system::{PackageLookup, ProcessEnvironment, RosPackagePath},
    InterpretOptions, LaunchInterpreter, UnknownElementPolicy,
};
use std::{
    path::{Path, PathBuf},
    process,
};

#[derive(Parser)]
#[command(name = "roslaunch_parser")]
#[command(about = "Resolve a ROS launch file into its runtime model", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Fail on unknown elements instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// Interpretation options file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a launch file from a package on ROS_PACKAGE_PATH
    Launch {
        /// Package name
        package: String,

        /// Launch file name
        file: String,

        /// Launch arguments (name:=value)
        #[arg(value_parser = parse_launch_arg)]
        args: Vec<(String, String)>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a launch file from a direct file path
    File {
        /// Launch file path
        path: PathBuf,

        /// Launch arguments (name:=value)
        #[arg(value_parser = parse_launch_arg)]
        args: Vec<(String, String)>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_launch_arg(s: &str) -> Result<(String, String), String> {
    match s.split_once(":=") {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("Invalid launch argument format: {}", s)),
    }
}

fn find_launch_file(package: &str, file: &str) -> Result<PathBuf, String> {
    let packages = RosPackagePath::from_environment(&ProcessEnvironment);
    let root = packages
        .find_package(package)
        .ok_or_else(|| format!("Package '{}' not found on ROS_PACKAGE_PATH", package))?;

    [root.join("launch").join(file), root.join(file)]
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| format!("Launch file not found: {} in package {}", file, package))
}

fn load_options(cli: &Cli) -> Result<InterpretOptions, Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => InterpretOptions::default(),
    };
    if cli.strict {
        options.unknown_elements = UnknownElementPolicy::Fail;
    }
    Ok(options)
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: invalid options: {}", e);
            process::exit(2);
        }
    };
    let interpreter = LaunchInterpreter::new().with_options(options);

    let result = match cli.command {
        Commands::Launch {
            package,
            file,
            args,
            output,
        } => {
            log::info!("Resolving launch file: {} from package {}", file, package);
            let launch_path = match find_launch_file(&package, &file) {
                Ok(path) => path,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            interpret_and_write(&interpreter, &launch_path, args, output.as_deref())
        }
        Commands::File { path, args, output } => {
            log::info!("Resolving launch file: {}", path.display());
            interpret_and_write(&interpreter, &path, args, output.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn interpret_and_write(
    interpreter: &LaunchInterpreter,
    launch_path: &Path,
    args: Vec<(String, String)>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = interpreter.interpret_file(launch_path, args)?;
    let json = model.to_json()?;

    match output {
        Some(output) => {
            std::fs::write(output, json)?;
            log::info!("Wrote runtime model: {}", output.display());
        }
        None => println!("{}", json),
    }
    log::info!(
        "  {} nodes, {} parameters, {} rosparam commands, {} machines",
        model.nodes.len(),
        model.parameters.len(),
        model.rosparam_commands.len(),
        model.machines.len()
    );

    Ok(())
}
