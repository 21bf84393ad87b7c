use clap::{arg, command, value_parser, ArgMatches, Command};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use stirbox::config::{self, Config, ExecutionMode, DEFAULT_CONFIG_FILE};
use stirbox::grid::kinetic_sum;
use stirbox::{plot, visualization, FluidError, Session};

fn main() {
    env_logger::init();

    let matches = command!()
        .arg(
            arg!(
                -c --config <FILE> "Sets the configuration file (default: stirbox.yaml)"
            )
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(
                -t --threads <THREADS> "Sets the number of worker threads, implies --parallel"
            )
            .required(false)
            .value_parser(value_parser!(usize)),
        )
        .arg(arg!(--parallel "Runs every stage on a rayon thread pool").required(false))
        .subcommand(
            Command::new("run")
                .about("Runs the simulation headless and prints the residuals")
                .arg(
                    arg!(
                        -n --substeps <SUBSTEPS> "Number of fixed-dt sub-steps"
                    )
                    .required(false)
                    .default_value("200")
                    .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(
                        --plot <PATH> "Writes the residual history as a PNG chart"
                    )
                    .required(false)
                    .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("view").about("Opens the interactive viewer"))
        .get_matches();

    if let Err(e) = dispatch(&matches) {
        eprintln!("{} {e}.", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn dispatch(matches: &ArgMatches) -> Result<(), FluidError> {
    let path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = config::load(&path)?;

    if let Some(&threads) = matches.get_one::<usize>("threads") {
        config.solver.threads = threads;
        config.solver.execution = ExecutionMode::Parallel;
    }
    if matches.get_flag("parallel") {
        config.solver.execution = ExecutionMode::Parallel;
    }

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            let substeps = sub_matches.get_one::<u64>("substeps").copied().unwrap_or(200);
            let plot_path = sub_matches.get_one::<PathBuf>("plot");
            run_headless(config, substeps, plot_path.map(PathBuf::as_path))
        }
        Some(("view", _)) | None => {
            let display = config.display.clone();
            let mut session = Session::new_with_fallback(config)?;
            visualization::run_viewer(&mut session, &display)
        }
        Some((other, _)) => Err(FluidError::Config(format!("unknown subcommand {other}"))),
    }
}

fn run_headless(config: Config, substeps: u64, plot_path: Option<&Path>) -> Result<(), FluidError> {
    let mut session = Session::new_with_fallback(config)?;
    let report_every = (substeps / 20).max(1);
    let start = Instant::now();

    println!(
        "\n{:>8} {:>10} {:>14} {:>8} {:>14}",
        "step".cyan().bold(),
        "time".cyan().bold(),
        "residual".cyan().bold(),
        "passes".cyan().bold(),
        "speed_sum".cyan().bold()
    );
    for step in 1..=substeps {
        session.substep();
        if step % report_every == 0 || step == substeps {
            let stats = session.stats();
            println!(
                "{:>8} {:>10.3} {:>14.6e} {:>8} {:>14.6}",
                step,
                session.physics_time(),
                stats.last_residual,
                stats.last_iterations,
                kinetic_sum(session.velocity())
            );
        }
    }
    println!(
        "\n{} {:.2} s.",
        "Elapsed time:".cyan().bold(),
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = plot_path {
        let history: Vec<f32> = session.stats().residual_history.iter().copied().collect();
        plot::residual_chart(&history, path, (800, 500))?;
        println!(
            "{} {}",
            "Residual chart written to".cyan().bold(),
            path.display().to_string().yellow().bold()
        );
    }
    Ok(())
}
