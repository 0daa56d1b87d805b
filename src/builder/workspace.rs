//! The project-level makefile that drives every package script.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::{Package, Project};

use super::makefile::{Assignment, Conditional, Makefile, Rule, Statement, Test};

/// Sibling packages `package` references from any configuration, in
/// declaration order.
pub fn package_dependencies<'a>(project: &'a Project, package: &Package) -> Vec<&'a Package> {
    let mut deps: Vec<&Package> = Vec::new();
    for cfg in &package.configurations {
        for name in &cfg.links {
            if name == &package.name {
                continue;
            }
            if let Some(sibling) = project.find_package(name) {
                if !deps.iter().any(|d| d.name == sibling.name) {
                    deps.push(sibling);
                }
            }
        }
    }
    deps
}

/// Packages ordered so every package comes after the siblings it uses.
///
/// Falls back to declaration order when the references form a cycle.
pub fn build_order(project: &Project) -> Vec<&Package> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..project.packages.len())
        .map(|i| graph.add_node(i))
        .collect();

    for (i, package) in project.packages.iter().enumerate() {
        for dep in package_dependencies(project, package) {
            if let Some(j) = project.packages.iter().position(|p| p.name == dep.name) {
                graph.update_edge(nodes[j], nodes[i], ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|n| &project.packages[graph[n]]).collect(),
        Err(cycle) => {
            let pkg = &project.packages[graph[cycle.node_id()]];
            tracing::warn!(
                "package `{}` is part of a dependency cycle; using declaration order",
                pkg.name
            );
            project.packages.iter().collect()
        }
    }
}

/// Emit the workspace makefile for `project`.
pub fn emit_workspace(project: &Project, verbose: bool) -> Makefile {
    let quiet = |cmd: String| if verbose { cmd } else { format!("@{}", cmd) };

    let mut mk = Makefile::new();
    mk.comment([
        "Makefile autogenerated by slipway".to_string(),
        format!(
            "Don't edit this file! Instead edit `{}` then rerun `slipway generate`",
            project.project_file
        ),
    ]);

    let default_config = project
        .packages
        .first()
        .and_then(|p| p.default_configuration())
        .map(|c| c.name.clone());
    if let Some(name) = default_config {
        mk.statements(vec![
            Statement::Conditional(
                Conditional::new(Test::IfNdef("CONFIG".into()))
                    .then(Assignment::simple("CONFIG", name)),
            ),
            Statement::Export("CONFIG".into()),
        ]);
    }

    let order = build_order(project);

    let mut phony = vec!["all".to_string(), "clean".to_string()];
    phony.extend(project.packages.iter().map(|p| p.name.clone()));
    mk.phony(phony);

    mk.rule(Rule::new("all").prerequisites(order.iter().map(|p| p.name.as_str())));

    for package in &project.packages {
        let deps = package_dependencies(project, package);
        let mut rule = Rule::new(&package.name).prerequisites(deps.iter().map(|d| d.name.as_str()));
        if !verbose {
            rule = rule.command(format!("@echo ==== Building {} ($(CONFIG)) ====", package.name));
        }
        mk.rule(rule.command(quiet(sub_make(project, package, None))));
    }

    mk.rule(
        Rule::new("clean").commands(
            project
                .packages
                .iter()
                .map(|p| quiet(sub_make(project, p, Some("clean")))),
        ),
    );

    mk
}

/// `$(MAKE)` invocation building one package script.
fn sub_make(project: &Project, package: &Package, goal: Option<&str>) -> String {
    let mut cmd = "$(MAKE) --no-print-directory".to_string();

    let dir = package.path.trim_end_matches('/');
    if !dir.is_empty() && dir != "." {
        cmd.push_str(" -C ");
        cmd.push_str(dir);
    }

    let script = project.script_name(package);
    if script != "Makefile" {
        cmd.push_str(" -f ");
        cmd.push_str(&script);
    }

    if let Some(goal) = goal {
        cmd.push(' ');
        cmd.push_str(goal);
    }
    cmd
}
