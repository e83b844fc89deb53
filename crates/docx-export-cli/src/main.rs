use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use clap::Parser;

use docx_export::{DocumentNode, export};

/// Exports a JSON document snapshot to a .docx file
#[derive(Parser, Debug)]
#[command(version, about = "Exports a JSON document snapshot to a .docx file", long_about = None)]
struct Args {
    /// The snapshot file to export; "-" reads from stdin
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// The output path
    #[arg(short, long, default_value = "out.docx", value_name = "FILE")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let input = if args.file == PathBuf::from("-") {
        read_stdin()
    } else {
        fs::read_to_string(&args.file).unwrap_or_else(|e| exit_io_error(e))
    };

    let snapshot: DocumentNode =
        serde_json::from_str(&input).unwrap_or_else(|e| exit_snapshot_error(e, &args.file));

    let buffer = export(&snapshot).unwrap_or_else(|e| exit_export_error(e));
    fs::write(&args.output, buffer).unwrap_or_else(|e| exit_io_error(e));
}

fn read_stdin() -> String {
    let mut buffer = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
        exit_io_error(e);
    }
    buffer
}

fn exit_snapshot_error(e: serde_json::Error, fp: &Path) -> ! {
    eprintln!("Invalid snapshot '{}': {}", fp.display(), e);
    std::process::exit(2);
}

fn exit_export_error(e: docx_export::ExportError) -> ! {
    eprintln!("Export error: {}", e);
    std::process::exit(2);
}

fn exit_io_error(e: std::io::Error) -> ! {
    eprintln!("IO Error: {}", e);
    std::process::exit(1);
}
