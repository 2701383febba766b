//! Walks build configurations, renders Dockerfiles and assembles the
//! manifest graph.
//!
//! Files are written as soon as they are rendered. A failing run leaves the
//! Dockerfiles of earlier packages on disk and writes no Makefile.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dbuilder_common::config::{
    BuildConfiguration, PackageEntry, TagSelector, TemplateSpec, verify_certs_from_env,
};
use dbuilder_common::constants::{BUILDER_REPOSITORY, DEFAULT_REGISTRY_HOST, MAKEFILE_NAME};
use dbuilder_common::error::{DbuilderError, Result};
use dbuilder_image::http::{BlockingHttpClient, HttpClient};
use dbuilder_image::reference::ImageReference;
use dbuilder_image::registry::Registry;
use petgraph::graph::NodeIndex;

use crate::graph::{ManifestGraph, TargetLevel};
use crate::render::{RenderVariables, TemplateRenderer, TeraRenderer};
use crate::sanitize::{artifact_filename, build_target, push_tag};

/// Outcome of a successful generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Dockerfiles written, in generation order.
    pub dockerfiles: Vec<PathBuf>,
    /// Path of the written Makefile.
    pub makefile: PathBuf,
    /// Number of packages processed.
    pub packages: usize,
    /// Number of targets in the graph, excluding the global one.
    pub targets: usize,
}

/// Accumulates Dockerfiles and the manifest graph across configurations.
pub struct ManifestBuilder<'a> {
    output_dir: PathBuf,
    client: &'a dyn HttpClient,
    renderer: &'a dyn TemplateRenderer,
    verify_certs: bool,
    graph: ManifestGraph,
    processed: HashSet<String>,
    dockerfiles: Vec<PathBuf>,
    packages: usize,
}

impl<'a> ManifestBuilder<'a> {
    /// Creates a builder writing into `output_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created.
    pub fn new(
        output_dir: &Path,
        client: &'a dyn HttpClient,
        renderer: &'a dyn TemplateRenderer,
        verify_certs: bool,
    ) -> Result<Self> {
        std::fs::create_dir_all(output_dir).map_err(|e| DbuilderError::io(output_dir, e))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            client,
            renderer,
            verify_certs,
            graph: ManifestGraph::new(),
            processed: HashSet::new(),
            dockerfiles: Vec::new(),
            packages: 0,
        })
    }

    /// The graph assembled so far.
    pub const fn graph(&self) -> &ManifestGraph {
        &self.graph
    }

    /// Loads `path` and adds its packages; templates resolve relative to
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or any package fails.
    pub fn add_configuration_file(&mut self, path: &Path) -> Result<()> {
        let config = BuildConfiguration::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        tracing::info!(path = %path.display(), packages = config.packages.len(), "loaded configuration");
        self.add_configuration(&config, base_dir)
    }

    /// Adds every package of `config` in document order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing package; see [`DbuilderError`].
    pub fn add_configuration(&mut self, config: &BuildConfiguration, base_dir: &Path) -> Result<()> {
        for package in &config.packages {
            self.add_package(config, package, base_dir)?;
        }
        Ok(())
    }

    fn add_package(
        &mut self,
        config: &BuildConfiguration,
        package: &PackageEntry,
        base_dir: &Path,
    ) -> Result<()> {
        let reference =
            ImageReference::parse(&package.reference)?.with_default_host(DEFAULT_REGISTRY_HOST);
        let host = reference.host().unwrap_or(DEFAULT_REGISTRY_HOST);
        let builder_namespace = config.builder_namespace(host);
        let display_name = reference.namespace().map_or_else(
            || reference.name().to_string(),
            |namespace| format!("{namespace}__{}", reference.name()),
        );
        let builder_repository = format!(
            "{}{builder_namespace}/{BUILDER_REPOSITORY}",
            reference.host_prefix()
        );
        tracing::info!(
            package = %package.reference,
            builder = %builder_repository,
            templates = package.settings.templates.len(),
            "processing package"
        );

        let mut template_targets = Vec::with_capacity(package.settings.templates.len());
        for template in &package.settings.templates {
            let template_tag = match &template.suffix {
                Some(suffix) => format!("{builder_repository}:{display_name}_{suffix}"),
                None => format!("{builder_repository}:{display_name}"),
            };
            let tag_targets = self.add_template(&reference, template, &template_tag, base_dir)?;
            template_targets.push(self.graph.add_group(
                &build_target(&template_tag),
                TargetLevel::Template,
                &tag_targets,
            ));
        }

        let repository = self.graph.add_group(
            &build_target(&builder_repository),
            TargetLevel::Repository,
            &template_targets,
        );
        self.graph.add_to_global(repository);
        self.packages += 1;
        Ok(())
    }

    fn add_template(
        &mut self,
        reference: &ImageReference,
        template: &TemplateSpec,
        template_tag: &str,
        base_dir: &Path,
    ) -> Result<Vec<NodeIndex>> {
        let template_path = base_dir.join(&template.file);
        let tags = self.resolve_tags(reference, &template.tags)?;
        let image_path = reference.image_path();
        tracing::debug!(
            template = %template_path.display(),
            tags = tags.len(),
            "rendering template"
        );

        let mut targets = Vec::with_capacity(tags.len());
        for tag in &tags {
            let docker_tag = format!("{template_tag}_{tag}");
            let filename = artifact_filename(&docker_tag);
            if !self.processed.insert(filename.clone()) {
                return Err(DbuilderError::DuplicateArtifact { filename });
            }

            let dockerfile = self.renderer.render(
                &template_path,
                &RenderVariables {
                    name: &image_path,
                    tag,
                    jinja_env: &template.jinja_env,
                },
            )?;
            let path = self.output_dir.join(&filename);
            std::fs::write(&path, dockerfile).map_err(|e| DbuilderError::io(&path, e))?;
            tracing::info!(path = %path.display(), "wrote dockerfile");
            self.dockerfiles.push(path);

            targets.push(self.graph.add_tag(
                &build_target(&docker_tag),
                &filename,
                &push_tag(&docker_tag),
            ));
        }
        Ok(targets)
    }

    /// Explicit lists are used verbatim; `all` asks the package's registry.
    fn resolve_tags(&self, reference: &ImageReference, selector: &TagSelector) -> Result<Vec<String>> {
        match selector {
            TagSelector::List(tags) => Ok(tags.clone()),
            TagSelector::All => {
                let host = reference.host().unwrap_or(DEFAULT_REGISTRY_HOST);
                let registry = Registry::create(self.client, host, self.verify_certs)?;
                let image = reference.image_full_name();
                tracing::info!(%registry, image = %image, "resolving all tags");
                registry.list_tags(self.client, &image)
            }
        }
    }

    /// Writes the Makefile and returns a summary of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the Makefile cannot be written.
    pub fn finish(self) -> Result<GenerateReport> {
        let targets = self.graph.targets().count();
        let makefile = self.output_dir.join(MAKEFILE_NAME);
        std::fs::write(&makefile, self.graph.render_makefile())
            .map_err(|e| DbuilderError::io(&makefile, e))?;
        tracing::info!(path = %makefile.display(), targets, "wrote makefile");

        Ok(GenerateReport {
            dockerfiles: self.dockerfiles,
            makefile,
            packages: self.packages,
            targets,
        })
    }
}

/// Renders every configuration file into `output_dir` using the real
/// registry client, Tera, and the `VERIFY_CERTS` environment toggle.
///
/// # Errors
///
/// Returns the first error encountered; see [`DbuilderError`].
pub fn generate(output_dir: &Path, configuration_files: &[PathBuf]) -> Result<GenerateReport> {
    let client = BlockingHttpClient::new()?;
    let renderer = TeraRenderer;
    let mut builder = ManifestBuilder::new(output_dir, &client, &renderer, verify_certs_from_env())?;
    for path in configuration_files {
        builder.add_configuration_file(path)?;
    }
    builder.finish()
}
