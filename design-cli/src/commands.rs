//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use design_core::schema::validate_element;
use design_core::surface::{catalog_for, SurfaceDefinition, SurfaceElementMap};
use design_core::{DesignDocument, Element, Template};
use design_renderer::{
    DefaultImageLoader, DocumentExporter, ExportRequest, ImageLoader, MultiSurfaceRenderer,
    RenderConfig, RenderedSurfaces,
};
use serde::Serialize;

use crate::{CliConfig, Command};

/// Run the configured command.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn run(config: CliConfig) -> anyhow::Result<()> {
    match &config.command {
        Command::Validate { file, template } => {
            let summary = validate(file, *template).await?;
            println!("{summary}");
        }
        Command::Export {
            file,
            format,
            quality,
            scale,
            background,
        } => {
            let request = ExportRequest {
                format: *format,
                quality: *quality,
                scale: *scale,
                background_color: background.clone(),
            };
            let path = export(&config, file, &request).await?;
            println!("{}", path.display());
        }
        Command::Surfaces { product, coverage } => {
            let surfaces = catalog_for(product, coverage)?;
            println!("{}", serde_json::to_string_pretty(&surfaces)?);
        }
        Command::Render {
            product,
            coverage,
            placements,
            background,
        } => {
            let manifest = render(&config, product, coverage, placements, background).await?;
            println!("{}", manifest.display());
        }
    }
    Ok(())
}

fn render_config(config: &CliConfig) -> RenderConfig {
    RenderConfig {
        load_system_fonts: config.load_system_fonts,
        ..RenderConfig::default()
    }
}

fn image_loader(config: &CliConfig) -> Arc<dyn ImageLoader> {
    match &config.assets_dir {
        Some(dir) => Arc::new(DefaultImageLoader::with_base_dir(dir)),
        None => Arc::new(DefaultImageLoader::new()),
    }
}

async fn read_json(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Validate a document or template file and describe it.
///
/// # Errors
///
/// Returns an error naming the violation if the file is invalid.
pub async fn validate(file: &Path, template: bool) -> anyhow::Result<String> {
    let json = read_json(file).await?;
    if template {
        let template = Template::from_json(&json)
            .with_context(|| format!("{} is not a valid template", file.display()))?;
        template.product()?;
        Ok(format!(
            "template '{}' ({}): {} elements, product {}",
            template.name,
            template.id,
            template.canvas_data.element_count(),
            template.product_type
        ))
    } else {
        let doc = DesignDocument::from_json(&json)
            .with_context(|| format!("{} is not a valid design document", file.display()))?;
        let size = doc.canvas_size();
        Ok(format!(
            "document: {}x{} canvas, {} elements",
            size.width,
            size.height,
            doc.element_count()
        ))
    }
}

/// Export a document file; returns the written path.
///
/// # Errors
///
/// Returns an error if the document is invalid or cannot be rendered or
/// written.
pub async fn export(
    config: &CliConfig,
    file: &Path,
    request: &ExportRequest,
) -> anyhow::Result<PathBuf> {
    let doc = DesignDocument::from_json(&read_json(file).await?)
        .with_context(|| format!("{} is not a valid design document", file.display()))?;

    let exporter = DocumentExporter::with_loader(&render_config(config), image_loader(config));
    let output = exporter.export(&doc, request).await?;
    for failure in &output.failures {
        tracing::warn!("image {} skipped: {}", failure.element_id, failure.reason);
    }

    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("design");
    let path = config
        .out_dir
        .join(format!("{stem}.{}", output.format.extension()));
    write_output(&path, &output.bytes).await?;
    Ok(path)
}

/// Parse a placements file: a JSON object from surface key to element list.
/// Every element is validated before anything is rendered.
///
/// # Errors
///
/// Returns an error for malformed JSON or any invalid element.
pub fn parse_placements(json: &str) -> anyhow::Result<SurfaceElementMap> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let Some(object) = value.as_object() else {
        bail!("placements must be a JSON object keyed by surface");
    };

    let mut map = SurfaceElementMap::new();
    for (key, elements) in object {
        let Some(elements) = elements.as_array() else {
            bail!("placements for '{key}' must be an array");
        };
        let mut parsed = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            validate_element(element)
                .with_context(|| format!("element {index} on '{key}' is invalid"))?;
            parsed.push(serde_json::from_value::<Element>(element.clone())?);
        }
        map.insert(key.clone(), parsed);
    }
    Ok(map)
}

/// Entry of the render manifest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry<'a> {
    key: &'a str,
    name: &'a str,
    file: String,
    width: u32,
    height: u32,
    element_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    product: &'a str,
    coverage: &'a str,
    surfaces: Vec<ManifestEntry<'a>>,
    failures: Vec<&'a design_renderer::ImageFailure>,
}

/// Render every surface of a product to `<out_dir>/<key>.png` plus a
/// `manifest.json`; returns the manifest path.
///
/// # Errors
///
/// Returns an error for unknown products/coverage, invalid placements, or
/// render and write failures.
pub async fn render(
    config: &CliConfig,
    product: &str,
    coverage: &str,
    placements: &Path,
    background: &str,
) -> anyhow::Result<PathBuf> {
    let surfaces: Vec<SurfaceDefinition> = catalog_for(product, coverage)?;
    let map = parse_placements(&read_json(placements).await?)
        .with_context(|| format!("invalid placements in {}", placements.display()))?;

    let renderer = MultiSurfaceRenderer::with_loader(
        RenderConfig {
            background_color: background.to_string(),
            ..render_config(config)
        },
        image_loader(config),
    );
    let rendered: RenderedSurfaces = renderer.render(&surfaces, &map).await?;

    let mut entries = Vec::with_capacity(rendered.len());
    for surface in &rendered.surfaces {
        let file = format!("{}.png", surface.key);
        write_output(&config.out_dir.join(&file), &surface.png).await?;
        entries.push(ManifestEntry {
            key: &surface.key,
            name: &surface.name,
            file,
            width: surface.width,
            height: surface.height,
            element_count: surface.element_count,
        });
    }

    let manifest = Manifest {
        product,
        coverage,
        surfaces: entries,
        failures: rendered.failures().collect(),
    };
    let path = config.out_dir.join("manifest.json");
    write_output(&path, serde_json::to_string_pretty(&manifest)?.as_bytes()).await?;
    tracing::info!("rendered {} surfaces into {}", rendered.len(), config.out_dir.display());
    Ok(path)
}

async fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}
