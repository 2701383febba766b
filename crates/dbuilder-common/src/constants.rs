//! System-wide constants and defaults.

use std::time::Duration;

/// Registry host assumed for references that do not name one.
pub const DEFAULT_REGISTRY_HOST: &str = "docker.io";

/// Builder namespace used when a host has no entry in the namespace mapping.
pub const DEFAULT_BUILDER_NAMESPACE: &str = "library";

/// Repository name of the synthetic builder image every Dockerfile is tagged into.
pub const BUILDER_REPOSITORY: &str = "dbuilder";

/// Namespace segment that Docker treats as implicit for official images.
pub const LIBRARY_NAMESPACE: &str = "library";

/// Literal (case-insensitive) tag selector that asks the registry for every tag.
pub const ALL_TAGS_KEYWORD: &str = "all";

/// File extension for rendered build-instruction files.
pub const DOCKERFILE_EXTENSION: &str = ".dockerfile";

/// Name of the aggregate dependency-graph file written to the output directory.
pub const MAKEFILE_NAME: &str = "Makefile";

/// Command the Makefile uses to build an image.
pub const DOCKER_BUILD_CMD: &str = "docker build --pull --no-cache";

/// Command the Makefile uses to push an image.
pub const DOCKER_PUSH_CMD: &str = "docker push";

/// Build context handed to the build command, relative to the output directory.
pub const DOCKER_BUILD_CONTEXT: &str = "../";

/// Environment variable toggling TLS certificate verification for registry calls.
pub const VERIFY_CERTS_ENV: &str = "VERIFY_CERTS";

/// Default configuration file path.
pub const DEFAULT_CONFIGURATION_FILE: &str = "config.yaml";

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./dockerfiles/";

/// Upper bound on a single registry HTTP request.
pub const REGISTRY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application name used in CLI output and the HTTP user agent.
pub const APP_NAME: &str = "dbuilder";
