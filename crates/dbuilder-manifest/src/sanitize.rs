//! Identifier sanitization for make targets, file names and push tags.

use dbuilder_common::constants::{DEFAULT_REGISTRY_HOST, DOCKERFILE_EXTENSION, LIBRARY_NAMESPACE};

/// Maps a docker reference to a make target name: `/` becomes `__` and
/// `:` becomes `~`.
///
/// Not injective; two references differing only in those characters share
/// a target name.
pub fn build_target(docker_reference: &str) -> String {
    docker_reference.replace('/', "__").replace(':', "~")
}

/// Maps a docker tag to the name of its rendered Dockerfile.
pub fn artifact_filename(docker_tag: &str) -> String {
    format!("{}{DOCKERFILE_EXTENSION}", docker_tag.replace('/', "__"))
}

/// Rewrites a docker tag into the form used by `docker build -t` and
/// `docker push`.
///
/// The public registry rejects pushes that spell out its own hostname, and
/// the local daemon distinguishes `library/<name>` from `<name>`, so the
/// `docker.io/` prefix and every `library` namespace segment are dropped.
pub fn push_tag(docker_tag: &str) -> String {
    let public_prefix = format!("{DEFAULT_REGISTRY_HOST}/");
    let tag = docker_tag.strip_prefix(&public_prefix).unwrap_or(docker_tag);

    // A `:` before the last `/` belongs to a host port, not the tag.
    let split = match (tag.rfind(':'), tag.rfind('/')) {
        (Some(colon), Some(slash)) if colon > slash => colon,
        (Some(colon), None) => colon,
        _ => tag.len(),
    };
    let (repository, version) = tag.split_at(split);

    let segments: Vec<&str> = repository.split('/').collect();
    let last = segments.len().saturating_sub(1);
    let kept: Vec<&str> = segments
        .iter()
        .enumerate()
        .filter(|&(i, segment)| i == last || *segment != LIBRARY_NAMESPACE)
        .map(|(_, segment)| *segment)
        .collect();

    format!("{}{version}", kept.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_target_replaces_separators() {
        assert_eq!(
            build_target("docker.dev/library/szn-jessie:latest"),
            "docker.dev__library__szn-jessie~latest"
        );
    }

    #[test]
    fn build_target_accepts_anything() {
        assert_eq!(build_target(""), "");
        assert_eq!(build_target("plain"), "plain");
        assert_eq!(build_target("a:b:c//d"), "a~b~c____d");
    }

    #[test]
    fn artifact_filename_keeps_colons() {
        assert_eq!(
            artifact_filename("docker.io/library/dbuilder:debian_10"),
            "docker.io__library__dbuilder:debian_10.dockerfile"
        );
    }

    #[test]
    fn push_tag_strips_public_host_and_library() {
        assert_eq!(
            push_tag("docker.io/library/dbuilder:debian_10"),
            "dbuilder:debian_10"
        );
    }

    #[test]
    fn push_tag_keeps_other_namespaces() {
        assert_eq!(
            push_tag("docker.io/builders/dbuilder:team__app_1.0"),
            "builders/dbuilder:team__app_1.0"
        );
    }

    #[test]
    fn push_tag_drops_library_on_private_hosts() {
        assert_eq!(
            push_tag("docker.dev/library/dbuilder:szn-jessie_latest"),
            "docker.dev/dbuilder:szn-jessie_latest"
        );
    }

    #[test]
    fn push_tag_only_drops_whole_segments() {
        assert_eq!(
            push_tag("docker.dev/mylibrary/dbuilder:x_1"),
            "docker.dev/mylibrary/dbuilder:x_1"
        );
        assert_eq!(push_tag("docker.dev/library:1"), "docker.dev/library:1");
    }

    #[test]
    fn push_tag_handles_host_ports() {
        assert_eq!(
            push_tag("localhost:5000/library/dbuilder:app_1"),
            "localhost:5000/dbuilder:app_1"
        );
    }
}
