mod errors;
mod lexer;
mod parser;
mod requests;
mod source;

use anyhow::{Context, Result};
use pico_args::Arguments;
use rustc_version_runtime::version_meta;
use std::{env::current_exe, fs, path::PathBuf, process::exit};
use tern_evaluator::{Evaluator, EvaluatorOptions, Reference};
use tern_log::*;

use errors::DiagnosticsContext;
use requests::{register_requests, CheckModule, EmitIr};
use source::SourceFiles;

const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
struct Args {
    debug_cycles: bool,
    dump_references: bool,
    emit_ir: bool,
    graphviz: bool,
    help: bool,
    stats: bool,
    verbose: bool,
    version: bool,
    source_files: Vec<String>,
}

fn process_args() -> Result<Args, pico_args::Error> {
    let mut args = Arguments::from_env();

    let res = Args {
        debug_cycles: args.contains("--debug-cycles"),
        dump_references: args.contains("--dump-references"),
        emit_ir: args.contains("--emit-ir"),
        graphviz: args.contains("--graphviz"),
        help: args.contains(["-h", "--help"]),
        stats: args.contains("--stats"),
        verbose: args.contains(["-v", "--verbose"]),
        version: args.contains(["-V", "--version"]),
        source_files: args.free()?,
    };

    Ok(res)
}

fn usage() -> String {
    let current_exe = current_exe().unwrap_or_else(|_| PathBuf::from(PACKAGE_NAME));
    let filename = current_exe
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| PACKAGE_NAME.to_owned());

    format!(
        concat!(
            "Usage: {} [options] file...\n",
            "Options:\n",
            "   --debug-cycles - log the active requests whenever a cycle is found\n",
            "   --dump-references - list the names each file depends on\n",
            "   --emit-ir - print the IR of every file that checks cleanly\n",
            "   --graphviz - print the request dependency graph in DOT format\n",
            "   -h, --help - view help\n",
            "   --stats - print per-request timing statistics\n",
            "   -v, --verbose - enable verbose output\n",
            "   -V, --version - show version\n",
        ),
        filename
    )
}

/// Checks every file, then prints whatever was asked for.
/// Returns whether any errors were reported.
fn run(args: &Args) -> Result<bool> {
    let mut files = SourceFiles::new();

    for path in &args.source_files {
        let text = fs::read_to_string(path).with_context(|| format!("couldn't read {}", path))?;
        files.add(path.as_str(), text);
    }

    let mut evaluator = Evaluator::with_options(EvaluatorOptions {
        debug_dump_cycles: args.debug_cycles,
        build_dependency_graph: args.graphviz || args.verbose,
        collect_statistics: args.stats,
    });
    register_requests(&mut evaluator);

    for file in files.iter() {
        if args.verbose {
            info!("checking {}...", file.name());
        }

        let check = CheckModule::new((file.clone(),));
        evaluator.evaluate_or_default(&check, false);

        if args.verbose {
            debug!("dependencies:\n{}", evaluator.dump_dependencies(&check));
        }

        if args.emit_ir {
            if let Ok(Some(ir)) = evaluator.evaluate(&EmitIr::new((file.clone(),))) {
                print!("{}", ir);
            }
        }
    }

    let diagnostics = evaluator.take_diagnostics();
    DiagnosticsContext::new(&files).emit_all(&diagnostics);

    if args.dump_references {
        for file in files.iter() {
            let mut references: Vec<Reference> = Vec::new();
            evaluator.enumerate_references_in_file(file.id(), |reference| {
                references.push(reference.clone())
            });
            references.sort();

            println!("{}:", file.name());
            for reference in references {
                println!("    {}", reference);
            }
        }
    }

    if args.stats {
        for stats in evaluator.statistics() {
            println!("{}", stats);
        }
    }

    if args.graphviz {
        print!("{}", evaluator.dependencies_graphviz());
    }

    Ok(diagnostics
        .iter()
        .any(|diag| diag.level == tern_evaluator::Level::Error))
}

fn main() {
    let args = match process_args() {
        Ok(args) => args,

        Err(pico_args::Error::UnusedArgsLeft(args)) => {
            let s_if_plural = if args.len() == 1 { "" } else { "s" };

            error!("unknown argument{}: {}", s_if_plural, args.join(", "));

            eprintln!("{}", usage());
            exit(1);
        },

        Err(err) => {
            error!("{}", err);
            eprintln!("{}", usage());
            exit(1);
        },
    };

    if args.help {
        println!("{}", usage());
        return;
    }

    if args.version || args.verbose {
        println!("{} {}", PACKAGE_NAME, VERSION);

        if args.verbose {
            println!("Compiled with {}", version_meta().short_version_string);
        }

        if args.version {
            return;
        }
    }

    if args.verbose {
        set_max_level(Level::Trace);
    }

    if args.source_files.is_empty() {
        error!("no source file provided");
        eprintln!("{}", usage());
        exit(1);
    }

    match run(&args) {
        Ok(false) => {},
        Ok(true) => exit(2),

        Err(err) => {
            error!("{:#}", err);
            exit(2);
        },
    }
}
