use clap::Parser;
use log::info;
use std::fs::File;
use std::io::Write;
use treeprove::{parse, Cli, Error};
use truthtree::{szs, Context, Prover, Verdict};

fn main() {
    use env_logger::Env;
    // log warnings and errors by default, do not print timestamps
    env_logger::Builder::from_env(Env::default().filter_or("LOG", "warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        print!("{}", szs::Status(e.kind()));
        if let Some(e) = e.source() {
            if let Err(e) = cli.output(e) {
                eprintln!("{}", e)
            }
        };
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let mut ctx = Context::default();
    let problem = parse::parse_file(&mut ctx, &cli.file)?;
    let mut prover = Prover::new(ctx, problem.premises, problem.goals, cli.options());
    let verdict = prover.prove()?;

    let stats = prover.stats();
    info!("{} inferences, {} nodes", stats.inferences, stats.nodes);
    if let Some(file) = &cli.stats {
        let mut f = File::create(file)?;
        writeln!(f, "{}", serde_json::to_string(stats)?)?;
    }

    let status = szs::status(verdict).map_err(Error::from)?;
    print!("{}", szs::Status(status));
    match verdict {
        Verdict::Valid => cli.output(prover.display_log())?,
        _ => {
            let ctx = prover.context();
            let cms = prover.countermodels();
            let cms: String = cms.iter().map(|cm| cm.display(ctx).to_string()).collect();
            cli.output(cms)?
        }
    }
    Ok(())
}
