//! Image command handlers.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use veriframe_client::images::{
    self, AdminImageFilter, DuplicateReport, ImageRecord, UploadOutcome,
};

use crate::cli::args::{AdminFilterArgs, DeleteArgs, FetchArgs, ImagesCommand, UploadArgs};
use crate::context::AppContext;
use crate::styled_output::{print_dim, print_info, print_success, print_warning};

/// Exit code for an upload rejected as a duplicate.
pub const DUPLICATE_EXIT_CODE: u8 = 2;

impl From<AdminFilterArgs> for AdminImageFilter {
    fn from(args: AdminFilterArgs) -> Self {
        Self {
            uploaded_by: args.uploaded_by,
            deepfake_label: args.deepfake_label,
            is_verified: args.is_verified,
            page: args.page,
            limit: args.limit,
        }
    }
}

/// One line per image: id, label, confidence, verification, uploader, time.
pub fn format_image(image: &ImageRecord) -> String {
    let label = image.deepfake_label.as_deref().unwrap_or("pending");
    let confidence = image
        .deepfake_confidence
        .map(|c| format!(" ({:.1}%)", c * 100.0))
        .unwrap_or_default();
    let verified = if image.is_verified {
        "verified"
    } else {
        "unverified"
    };
    let uploader = image.uploader_username.as_deref().unwrap_or("-");
    format!(
        "#{:<6} {label}{confidence}  {verified}  {uploader}  {}",
        image.id,
        image.uploaded_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn format_duplicate(report: &DuplicateReport) -> String {
    let mut line = format!(
        "{}: {} match at {} stage, similarity {:.2}",
        report.summary(),
        report.duplicate_type,
        report.stage,
        report.similarity
    );
    if let Some(id) = report.image_id {
        line.push_str(&format!(" (existing image #{id})"));
    }
    line
}

fn print_images(ctx: &AppContext, images: &[ImageRecord]) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(images)?);
        return Ok(());
    }
    if images.is_empty() {
        print_info("No images");
        return Ok(());
    }
    for image in images {
        println!("{}", format_image(image));
    }
    Ok(())
}

fn require_login(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        bail!("Not logged in. Run 'veriframe login' first.");
    }
    Ok(())
}

pub async fn run_upload(ctx: &AppContext, args: UploadArgs) -> Result<ExitCode> {
    require_login(ctx)?;

    let outcome = images::upload_image_from_path(ctx.client(), &args.file)
        .await
        .with_context(|| format!("Image upload failed: {}", args.file.display()))?;

    match outcome {
        UploadOutcome::Stored(image) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&image)?);
            } else {
                print_success(&format!("Uploaded image #{}", image.id));
                println!("{}", format_image(&image));
                if let Some(tx) = &image.blockchain_tx {
                    print_dim(&format!("Blockchain tx: {tx}"));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        UploadOutcome::Duplicate(report) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_warning(&format_duplicate(&report));
            }
            Ok(ExitCode::from(DUPLICATE_EXIT_CODE))
        }
    }
}

pub async fn run(ctx: &AppContext, command: ImagesCommand) -> Result<()> {
    match command {
        ImagesCommand::Mine => {
            require_login(ctx)?;
            let images = images::my_images(ctx.client()).await?;
            print_images(ctx, &images)
        }
        ImagesCommand::All(filter) => {
            require_login(ctx)?;
            let page = images::admin_images(ctx.client(), &filter.into()).await?;
            print_images(ctx, &page.images)?;
            if let (false, Some(total)) = (ctx.json, page.total) {
                print_dim(&format!("{} of {total} images", page.images.len()));
            }
            Ok(())
        }
        ImagesCommand::Verified => {
            require_login(ctx)?;
            let images = images::verified_images(ctx.client()).await?;
            print_images(ctx, &images)
        }
        ImagesCommand::Fetch(args) => run_fetch(ctx, args).await,
        ImagesCommand::Delete(args) => run_delete(ctx, args).await,
        ImagesCommand::Url { id } => {
            println!("{}", images::image_url(ctx.client(), id));
            Ok(())
        }
    }
}

async fn run_fetch(ctx: &AppContext, args: FetchArgs) -> Result<()> {
    require_login(ctx)?;
    let file = images::fetch_image(ctx.client(), args.id).await?;
    tokio::fs::write(&args.output, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    print_success(&format!(
        "Saved image #{} to {} ({} bytes, {})",
        args.id,
        args.output.display(),
        file.bytes.len(),
        file.content_type.as_deref().unwrap_or("unknown type")
    ));
    Ok(())
}

async fn run_delete(ctx: &AppContext, args: DeleteArgs) -> Result<()> {
    require_login(ctx)?;
    if !ctx.session.is_admin() {
        bail!("Deleting images requires an administrator account");
    }
    let message = images::delete_image(ctx.client(), args.id).await?;
    print_success(&message);
    Ok(())
}
