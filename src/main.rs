use anyhow::{Context, Result};
use log::debug;

use lupa::analysis::inter::InterProcedural;
use lupa::config::LupaConfig;
use lupa::ir::io::load_program;
use lupa::memory::{AliasOracle, AliasSets, NameAlias, UniversalAlias};
use lupa::options::{AliasMode, Options};

fn main() -> Result<()> {
    if std::env::var("LUPA_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("LUPA_LOG")
            .write_style("LUPA_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut flags = shellwords::split(&std::env::var("LUPA_FLAGS").unwrap_or_default())
        .context("LUPA_FLAGS has unbalanced quotes")?;
    flags.extend(std::env::args().skip(1));
    let options = match Options::parse_from_args(&flags) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    debug!("lupa options: {:?}", options);

    let config = LupaConfig::load_from_file(&options.config)?;
    let program = load_program(&options.input)
        .with_context(|| format!("failed to load program {}", options.input))?;

    let oracle: Box<dyn AliasOracle> = match options.alias_mode {
        AliasMode::Name => Box::new(NameAlias),
        AliasMode::All => Box::new(UniversalAlias),
        AliasMode::File => {
            let path = options.alias_file.as_deref().unwrap_or_default();
            Box::new(
                AliasSets::load(path)
                    .with_context(|| format!("failed to load alias sets {}", path))?,
            )
        }
    };

    let driver = InterProcedural::new(&program, oracle.as_ref(), &config)
        .context("invalid lock primitive pattern")?;
    if let Some(path) = &options.viz_callgraph {
        driver
            .callgraph()
            .write_dot(&program, path)
            .with_context(|| format!("failed to write call graph to {}", path))?;
    }

    let stat = driver.run();
    if !options.quiet {
        println!("{}", stat);
    }
    if let Some(path) = &options.output {
        stat.save_to_file(path)
            .with_context(|| format!("failed to save report to {}", path))?;
    }
    Ok(())
}
