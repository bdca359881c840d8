use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use fontqa::{
    check_fonts, registry, report,
    scaffold::{scaffold, CheckSkeleton},
    Args, CheckArgs, Command, Config, Error, ScaffoldArgs,
};
use fontqa_core::{CheckId, Registry};
use log::{error, info};

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::builder()
        .filter_level(args.log_filter())
        .parse_default_env()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{}: {:?}: {style}{}{style:#}: {}",
                ts,
                std::thread::current().id(),
                record.level(),
                record.args()
            )
        })
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, Error> {
    match &args.command {
        Command::Check(check) => run_check(&registry()?, check),
        Command::List { profile } => {
            let registry = registry()?;
            let profile = registry.resolve_profile(profile)?;
            let mut stdout = io::stdout().lock();
            report::write_check_list(&mut stdout, &registry, &profile)
                .map_err(Error::StdioWriteFail)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Scaffold(scaffold_args) => run_scaffold(scaffold_args),
    }
}

fn run_check(registry: &Registry, args: &CheckArgs) -> Result<ExitCode, Error> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.warn_unknown(registry);

    let mut options = args.run_options();
    options.configuration = config.into_configuration();
    let run = check_fonts(registry, &args.profile, &args.fonts, &options, args.hotfix)?;

    let mut stdout = io::stdout().lock();
    report::write_terminal(
        &mut stdout,
        &run.outcomes,
        &run.summary,
        args.loglevel,
        args.quiet,
    )
    .map_err(Error::StdioWriteFail)?;
    if let Some(path) = &args.json {
        report::write_json(path, &run.outcomes, &run.summary)?;
        info!("Wrote {}", path.display());
    }

    Ok(if run.fails_on(args.error_code_on) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_scaffold(args: &ScaffoldArgs) -> Result<ExitCode, Error> {
    let mut skeleton = CheckSkeleton::new(CheckId::new(&args.check_id)?);
    if let Some(title) = &args.title {
        skeleton.title = title.clone();
    }
    if let Some(rationale) = &args.rationale {
        skeleton.rationale = rationale.clone();
    }
    skeleton.proposals = args.proposal.clone();

    let done = scaffold(&args.root, &skeleton)?;
    let mut stdout = io::stdout().lock();
    let mut say = |line: String| writeln!(stdout, "{line}").map_err(Error::StdioWriteFail);
    for path in done.created.iter() {
        say(format!("created {}", path.display()))?;
    }
    for path in done.updated.iter() {
        say(format!("updated {}", path.display()))?;
    }
    if let Some(path) = &done.kept {
        say(format!("{} already exists, left untouched", path.display()))?;
    } else {
        say(format!(
            "Add {}::check()? to the list of checks to register it",
            skeleton.id.module_path().join("::")
        ))?;
    }
    Ok(ExitCode::SUCCESS)
}
