use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use dx_cli::evaluate::run_evaluation;
use dx_cli::input::RunConfig;
use dx_cli::train::run_training;

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to the JSON run configuration")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn data_arg() -> Arg {
    Arg::new("data")
        .short('d')
        .long("data")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help(
            "Path (*.csv or *.tsv) or http(s) URL of the record table. \
             Overrides the data source specified in the configuration file.",
        )
        .value_hint(ValueHint::FilePath)
}

fn experiment_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("n_estimators")
            .long("n_estimators")
            .help("Number of trees in the forest. Overrides the configuration file.")
            .value_parser(clap::value_parser!(usize)),
    )
    .arg(
        Arg::new("test_fraction")
            .long("test_fraction")
            .help("Fraction of rows held out for evaluation, in (0, 1).")
            .value_parser(clap::value_parser!(f64)),
    )
    .arg(
        Arg::new("seed")
            .long("seed")
            .help("Seed for both the row split and the forest.")
            .value_parser(clap::value_parser!(u64)),
    )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default()
                .filter_or("DX_LOG", "error,dx=info,dx_classifiers=info,dx_cli=info"),
        )
        .init();

    let matches = Command::new("dx")
        .version(clap::crate_version!())
        .about("\u{1FA7A} dx - random-forest diagnosis of tumour biopsy records")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(experiment_args(
            Command::new("train")
                .about("Prepare the data, train a random forest and save it")
                .arg(config_arg())
                .arg(data_arg())
                .arg(
                    Arg::new("model_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "File the trained model will be written to. \
                             Overrides the model_file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                ),
        ))
        .subcommand(experiment_args(
            Command::new("evaluate")
                .about("Score a trained (or freshly trained) model on the held-out rows")
                .arg(config_arg())
                .arg(data_arg())
                .arg(
                    Arg::new("model_file")
                        .short('m')
                        .long("model")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to a model written by `dx train`")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("report_file")
                        .short('r')
                        .long("report")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Write an HTML evaluation report to this path")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("heatmap_file")
                        .long("heatmap")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Write the confusion matrix heatmap (HTML) to this path")
                        .value_hint(ValueHint::FilePath),
                ),
        ))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Without a config file or data override there is nothing to run: print
/// the default configuration as a template instead.
fn print_template_if_unconfigured(matches: &ArgMatches) -> Result<bool> {
    if matches.get_one::<PathBuf>("config").is_some() || matches.get_one::<String>("data").is_some() {
        return Ok(false);
    }
    eprintln!("[dx] No config file provided; printing the default configuration.");
    println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
    Ok(true)
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    if print_template_if_unconfigured(matches)? {
        return Ok(());
    }
    let config_path: Option<&PathBuf> = matches.get_one("config");
    log::info!("[dx::train] Training from config: {:?}", config_path);

    let config = RunConfig::from_arguments(config_path, matches)?;
    match run_training(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    if print_template_if_unconfigured(matches)? {
        return Ok(());
    }
    let config_path: Option<&PathBuf> = matches.get_one("config");
    log::info!("[dx::evaluate] Evaluating with config: {:?}", config_path);

    let config = RunConfig::from_arguments(config_path, matches)?;
    match run_evaluation(&config) {
        Ok(evaluation) => {
            eprintln!(
                "[dx::evaluate] Completed evaluation of {} rows, accuracy {:.4}.",
                evaluation.confusion.total(),
                evaluation.accuracy()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
