//! Upload and download commands.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use clap::Args;
use console::Style;
use portico_client::{FormField, FormValue};

use super::{Context, print_json};
use crate::session;

/// Arguments for the upload command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// API path to post to (e.g. "files/avatar")
    pub path: String,

    /// File to attach, as `name=path` or just `path` (sent as field "file")
    #[arg(short, long = "file", required = true)]
    pub files: Vec<String>,

    /// Extra text field, as `key=value`
    #[arg(long = "field", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,
}

/// Arguments for the download command.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// API path to fetch
    pub path: String,

    /// Where to write the downloaded bytes
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Run the upload command.
pub async fn upload(args: UploadArgs, ctx: &Context) -> Result<()> {
    let mut form = Vec::with_capacity(args.files.len() + args.fields.len());

    for spec in &args.files {
        let (name, path) = match spec.split_once('=') {
            Some((name, path)) => (name.to_string(), PathBuf::from(path)),
            None => ("file".to_string(), PathBuf::from(spec)),
        };
        form.push(FormField::new(name, read_file_value(&path)?));
    }
    for (key, value) in args.fields {
        form.push(FormField::new(key, value));
    }

    let session = session::connect(ctx)?;
    let response: serde_json::Value = session.client.upload(&args.path, form, None).await?;

    if ctx.json_output {
        print_json(&response)?;
    } else {
        let green = Style::new().green();
        println!(
            "{} Uploaded {} file(s) to {}",
            green.apply_to("✓"),
            args.files.len(),
            args.path
        );
        if ctx.verbose {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Run the download command.
pub async fn download(args: DownloadArgs, ctx: &Context) -> Result<()> {
    let session = session::connect(ctx)?;
    let blob = session.client.download(&args.path, None).await?;

    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&args.output, blob.bytes())
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::debug!(
        path = %args.path,
        bytes = blob.len(),
        content_type = ?blob.content_type(),
        "download complete"
    );

    if ctx.json_output {
        print_json(&serde_json::json!({
            "path": args.output.display().to_string(),
            "bytes": blob.len(),
            "contentType": blob.content_type(),
        }))?;
    } else {
        let green = Style::new().green();
        let dim = Style::new().dim();
        println!(
            "{} Saved {} {}",
            green.apply_to("✓"),
            args.output.display(),
            dim.apply_to(format!("({} bytes)", blob.len()))
        );
    }

    Ok(())
}

fn read_file_value(path: &Path) -> Result<FormValue> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("not a file: {}", path.display()))?;
    Ok(FormValue::file(file_name, bytes))
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}
