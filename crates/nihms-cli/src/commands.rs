use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tracing::info_span;

use nihms_cli::config::AssemblyConfig;
use nihms_cli::package::{WrittenPackage, assemble, load_submission, write_package, write_resource};
use nihms_model::SubmissionCatalog;

use crate::cli::{AssembleArgs, CatalogArgs, ShowArgs, SubmissionArgs};

pub fn run_assemble(args: &AssembleArgs, config: &AssemblyConfig) -> Result<WrittenPackage> {
    let mut options = config.package_options();
    if let Some(archive) = args.archive {
        options.archive = archive.into();
    }
    if let Some(compression) = args.compression {
        options.compression = compression.into();
    }
    let submission = load_submission(&args.submission)?;
    let span = info_span!("assemble", submission = %submission.id);
    let _guard = span.enter();

    let stream = assemble(&submission, options)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    write_package(&stream, &output_dir)
}

pub fn print_written(package: &WrittenPackage) {
    println!("Package: {}", package.name);
    println!("Path: {}", package.path.display());
    println!("Spec: {}", package.spec);
    println!("Mime type: {}", package.mime_type);
    println!("Bytes: {}", package.bytes);
    println!("SHA-256: {}", package.sha256);
}

pub fn run_resources(args: &SubmissionArgs, config: &AssemblyConfig) -> Result<()> {
    let submission = load_submission(&args.submission)?;
    let stream = assemble(&submission, config.package_options())?;
    let metadata = stream.metadata();
    println!("Package: {}", metadata.name().unwrap_or_default());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Name"),
        header_cell("Mime type"),
        header_cell("Size"),
    ]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(3) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for (index, resource) in stream.resources().enumerate() {
        let size = match resource.size_bytes {
            Some(size) => Cell::new(size),
            None => Cell::new("-").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&resource.name),
            Cell::new(&resource.mime_type),
            size,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_show(args: &ShowArgs, config: &AssemblyConfig) -> Result<()> {
    let submission = load_submission(&args.submission)?;
    let stream = assemble(&submission, config.package_options())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_resource(&stream, &args.resource, &mut out)?;
    out.flush().context("flush stdout")?;
    Ok(())
}

pub fn run_catalog(args: &CatalogArgs) -> Result<()> {
    let catalog = SubmissionCatalog::scan(&args.dir)
        .with_context(|| format!("scan {}", args.dir.display()))?;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Submission"), header_cell("Document")]);
    apply_table_style(&mut table);
    for id in catalog.ids() {
        let document = catalog
            .lookup(id)
            .map(|path| relative_to(path, catalog.dir()))
            .unwrap_or_default();
        table.add_row(vec![Cell::new(id), Cell::new(document)]);
    }
    println!("{table}");
    println!("{} submission(s)", catalog.len());
    Ok(())
}

fn relative_to(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
