//! Build/push dependency graph using `petgraph`.
//!
//! Targets nest in four levels: tag, template, repository and the single
//! global target. Every target yields a `build-<name>` / `push-<name>` rule
//! pair in the rendered Makefile; higher levels only carry prerequisites.

use std::collections::HashMap;
use std::fmt::Write as _;

use dbuilder_common::constants::{DOCKER_BUILD_CMD, DOCKER_BUILD_CONTEXT, DOCKER_PUSH_CMD};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

/// Nesting level of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLevel {
    /// One rendered Dockerfile.
    Tag,
    /// All tags of one template.
    Template,
    /// All templates of the packages sharing a builder repository.
    Repository,
    /// The top-level `build` / `push` targets.
    Global,
}

/// Commands run by a tag-level target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Dockerfile name, relative to the output directory.
    pub dockerfile: String,
    /// Tag passed to `docker build -t` and `docker push`.
    pub image_tag: String,
}

/// A node of the manifest graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Sanitized target name, without the `build-` / `push-` prefix.
    pub name: String,
    /// Nesting level.
    pub level: TargetLevel,
    /// Present on tag-level targets only.
    pub recipe: Option<Recipe>,
}

impl Target {
    fn rule_names(&self) -> (String, String) {
        match self.level {
            TargetLevel::Global => ("build".into(), "push".into()),
            _ => (format!("build-{}", self.name), format!("push-{}", self.name)),
        }
    }
}

/// The accumulated build/push graph of a generation run.
#[derive(Debug)]
pub struct ManifestGraph {
    graph: petgraph::Graph<Target, ()>,
    by_name: HashMap<String, NodeIndex>,
    global: NodeIndex,
}

impl ManifestGraph {
    /// Creates a graph holding only the global target.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = petgraph::Graph::new();
        let global = graph.add_node(Target {
            name: String::new(),
            level: TargetLevel::Global,
            recipe: None,
        });
        Self {
            graph,
            by_name: HashMap::new(),
            global,
        }
    }

    /// Adds a tag-level target that builds `dockerfile` as `image_tag`.
    ///
    /// An existing target of the same name is returned unchanged.
    pub fn add_tag(&mut self, name: &str, dockerfile: &str, image_tag: &str) -> NodeIndex {
        self.get_or_add(name, TargetLevel::Tag, || {
            Some(Recipe {
                dockerfile: dockerfile.to_string(),
                image_tag: image_tag.to_string(),
            })
        })
    }

    /// Adds (or extends) an aggregate target depending on `members`.
    ///
    /// Repository targets are shared by every package of a builder
    /// repository, so a second call with the same name appends prerequisites
    /// to the existing target.
    pub fn add_group(&mut self, name: &str, level: TargetLevel, members: &[NodeIndex]) -> NodeIndex {
        let group = self.get_or_add(name, level, || None);
        for &member in members {
            self.add_dependency(group, member);
        }
        group
    }

    /// Makes the global `build` / `push` targets depend on `member`.
    pub fn add_to_global(&mut self, member: NodeIndex) {
        self.add_dependency(self.global, member);
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent` so that
    /// topological sort yields dependencies first. Repeated edges are ignored.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        if self.graph.find_edge(dependency, dependent).is_none() {
            let _ = self.graph.add_edge(dependency, dependent, ());
        }
    }

    fn get_or_add(
        &mut self,
        name: &str,
        level: TargetLevel,
        recipe: impl FnOnce() -> Option<Recipe>,
    ) -> NodeIndex {
        if let Some(&existing) = self.by_name.get(name) {
            return existing;
        }
        let index = self.graph.add_node(Target {
            name: name.to_string(),
            level,
            recipe: recipe(),
        });
        let _ = self.by_name.insert(name.to_string(), index);
        index
    }

    /// Looks up a target by its sanitized name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.by_name
            .get(name)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// Direct prerequisites of `index`, in the order they were added.
    pub fn dependencies(&self, index: NodeIndex) -> Vec<&Target> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| (edge.id(), edge.source()))
            .collect();
        edges.sort_unstable_by_key(|&(id, _)| id);
        edges
            .into_iter()
            .filter_map(|(_, source)| self.graph.node_weight(source))
            .collect()
    }

    /// Names of the direct prerequisites of the target called `name`.
    ///
    /// An empty name selects the global target.
    pub fn dependency_names(&self, name: &str) -> Vec<&str> {
        let index = if name.is_empty() {
            Some(self.global)
        } else {
            self.by_name.get(name).copied()
        };
        index.map_or_else(Vec::new, |index| {
            self.dependencies(index)
                .into_iter()
                .map(|target| target.name.as_str())
                .collect()
        })
    }

    /// Every target except the global one, in insertion order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.graph
            .node_indices()
            .filter(move |&index| index != self.global)
            .filter_map(|index| self.graph.node_weight(index))
    }

    /// Serializes the graph as a Makefile.
    pub fn render_makefile(&self) -> String {
        let mut out = format!(
            "#!/usr/bin/make -f\n\
             all: build\n\t\n\
             .PHONY: build push all\n\
             DOCKER_PUSH_CMD :={DOCKER_PUSH_CMD}\n\
             DOCKER_BUILD_CMD :={DOCKER_BUILD_CMD}\n\
             DOCKER_BUILD_CONTEXT :={DOCKER_BUILD_CONTEXT}\n\n\n"
        );

        for index in self.graph.node_indices().filter(|&i| i != self.global) {
            self.write_rules(&mut out, index);
        }
        self.write_rules(&mut out, self.global);
        out
    }

    fn write_rules(&self, out: &mut String, index: NodeIndex) {
        let Some(target) = self.graph.node_weight(index) else {
            return;
        };
        let (build, push) = target.rule_names();

        let dependencies = self.dependencies(index);
        let prerequisites = |prefix: &str| {
            dependencies
                .iter()
                .map(|dep| dep.rule_names())
                .map(|(b, p)| if prefix == "build" { b } else { p })
                .collect::<Vec<_>>()
                .join(" ")
        };

        // A template target can share its name with a tag target of a
        // sibling template; the merged node keeps both recipe and prerequisites.
        if let Some(recipe) = &target.recipe {
            let _ = writeln!(
                out,
                "{}\n\t$(DOCKER_BUILD_CMD) -f {} -t {} $(DOCKER_BUILD_CONTEXT)",
                rule_head(&build, &prerequisites("build")),
                recipe.dockerfile,
                recipe.image_tag
            );
            let _ = writeln!(
                out,
                "{}\n\t$(DOCKER_PUSH_CMD) {}\n",
                rule_head(&push, &prerequisites("push")),
                recipe.image_tag
            );
            return;
        }

        let _ = writeln!(out, "{build}: {}\n", prerequisites("build"));
        let _ = writeln!(out, "{push}: {}\n", prerequisites("push"));
        if target.level != TargetLevel::Global {
            let _ = writeln!(out, ".PHONY: {build} {push}\n");
        }
    }
}

fn rule_head(rule: &str, prerequisites: &str) -> String {
    if prerequisites.is_empty() {
        format!("{rule}:")
    } else {
        format!("{rule}: {prerequisites}")
    }
}

impl Default for ManifestGraph {
    fn default() -> Self {
        Self::new()
    }
}
