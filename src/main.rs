use std::process;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use reg_reader::{
    file_struct::windows::registry::{ErrorPolicy, HiveOptions, RootStrategy},
    modules::registry::RegistryModule,
    utils::{log, MRError},
};

/// Print the key tree of an offline registry hive
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the hive file
    hive: String,

    /// Print each key's record fields and modification time
    #[arg(short, long)]
    full: bool,

    /// Print the base block fields before the tree
    #[arg(long)]
    header: bool,

    /// Take the root from the header's root cell offset instead of scanning
    #[arg(long)]
    use_header_root: bool,

    /// Report broken subtrees and continue with their siblings
    #[arg(short, long)]
    keep_going: bool,

    /// Largest cell, in bytes, the reader accepts
    #[arg(long, default_value_t = 4096)]
    max_cell_size: usize,

    /// More log output, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(cli: &Cli) -> Result<bool, MRError> {
    let options = HiveOptions {
        root_strategy: if cli.use_header_root { RootStrategy::Header } else { RootStrategy::Scan },
        on_error: if cli.keep_going { ErrorPolicy::SkipSubtree } else { ErrorPolicy::Abort },
        max_cell_size: cli.max_cell_size,
        ..Default::default()
    };
    let module = RegistryModule::new(&cli.hive, options)?;
    if cli.header {
        module.print_header()?;
    }
    let stats = module.print_tree(cli.full)?;
    Ok(stats.errors == 0)
}

/// Help and version requests keep clap's own exit; usage errors exit 1.
fn is_informational(e: &clap::Error) -> bool {
    matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn main() {
    sigpipe::reset();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => {
            println!("{}{}", "[Error]:".bright_red(), e);
            process::exit(1);
        }
    };
    log::init(log::verbosity_to_level(cli.verbose));

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            println!("{}{}", "[Error]:".bright_red(), e);
            process::exit(1);
        }
    }
}
