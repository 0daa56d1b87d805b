//! Structured GNU make documents.
//!
//! The emitter builds a [`Makefile`] out of sections and renders it once.
//! Rendering is a pure function of the sections, so generating the same
//! document twice yields the same bytes.

use std::fmt::{self, Write as _};

use serde::Serialize;

/// Assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    /// `:=`
    Simple,
    /// `=`
    Recursive,
    /// `+=`
    Append,
}

impl AssignOp {
    fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Simple => ":=",
            AssignOp::Recursive => "=",
            AssignOp::Append => "+=",
        }
    }
}

/// `NAME op value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub name: String,
    pub op: AssignOp,
    pub value: String,
}

impl Assignment {
    pub fn simple(name: impl Into<String>, value: impl Into<String>) -> Self {
        Assignment {
            name: name.into(),
            op: AssignOp::Simple,
            value: value.into(),
        }
    }

    pub fn recursive(name: impl Into<String>, value: impl Into<String>) -> Self {
        Assignment {
            name: name.into(),
            op: AssignOp::Recursive,
            value: value.into(),
        }
    }

    pub fn append(name: impl Into<String>, value: impl Into<String>) -> Self {
        Assignment {
            name: name.into(),
            op: AssignOp::Append,
            value: value.into(),
        }
    }

    fn render(&self, out: &mut String, indent: &str) {
        out.push_str(indent);
        out.push_str(&self.name);
        out.push(' ');
        out.push_str(self.op.as_str());
        if !self.value.is_empty() {
            out.push(' ');
            out.push_str(&self.value);
        }
        out.push('\n');
    }
}

/// Condition of a conditional block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Test {
    /// `ifndef VAR`
    IfNdef(String),
    /// `ifeq (lhs,rhs)`
    IfEq(String, String),
}

/// `ifeq`/`ifndef` block of indented assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conditional {
    pub test: Test,
    pub then: Vec<Assignment>,
    pub otherwise: Vec<Assignment>,
}

impl Conditional {
    pub fn new(test: Test) -> Self {
        Conditional {
            test,
            then: Vec::new(),
            otherwise: Vec::new(),
        }
    }

    pub fn then(mut self, assignment: Assignment) -> Self {
        self.then.push(assignment);
        self
    }

    pub fn otherwise(mut self, assignment: Assignment) -> Self {
        self.otherwise.push(assignment);
        self
    }

    fn render(&self, out: &mut String) {
        match &self.test {
            Test::IfNdef(var) => {
                let _ = writeln!(out, "ifndef {}", var);
            }
            Test::IfEq(lhs, rhs) => {
                let _ = writeln!(out, "ifeq ({},{})", lhs, rhs);
            }
        }
        for a in &self.then {
            a.render(out, "  ");
        }
        if !self.otherwise.is_empty() {
            out.push_str("else\n");
            for a in &self.otherwise {
                a.render(out, "  ");
            }
        }
        out.push_str("endif\n");
    }
}

/// Top-level statement inside a [`Section::Statements`] block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Statement {
    Assign(Assignment),
    Conditional(Conditional),
    /// `export VAR`
    Export(String),
}

/// An explicit rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub target: String,
    pub prerequisites: Vec<String>,
    /// Recipe lines, without the leading tab
    pub recipe: Vec<String>,
}

impl Rule {
    pub fn new(target: impl Into<String>) -> Self {
        Rule {
            target: target.into(),
            prerequisites: Vec::new(),
            recipe: Vec::new(),
        }
    }

    pub fn prerequisite(mut self, prerequisite: impl Into<String>) -> Self {
        self.prerequisites.push(prerequisite.into());
        self
    }

    pub fn prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites
            .extend(prerequisites.into_iter().map(Into::into));
        self
    }

    pub fn command(mut self, line: impl Into<String>) -> Self {
        self.recipe.push(line.into());
        self
    }

    pub fn commands<I>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.recipe.extend(lines);
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.target);
        out.push(':');
        for p in &self.prerequisites {
            out.push(' ');
            out.push_str(p);
        }
        out.push('\n');
        for line in &self.recipe {
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// A block of the document. Sections are separated by one blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum Section {
    Comment { lines: Vec<String> },
    Statements { statements: Vec<Statement> },
    /// `NAME := \` followed by one item per line
    List { name: String, items: Vec<String> },
    Phony { targets: Vec<String> },
    Rule { rule: Rule },
    Include { optional: bool, pattern: String },
}

/// A complete make document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Makefile {
    pub sections: Vec<Section>,
}

impl Makefile {
    pub fn new() -> Self {
        Makefile::default()
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn comment<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Section::Comment {
            lines: lines.into_iter().map(Into::into).collect(),
        });
    }

    pub fn statements(&mut self, statements: Vec<Statement>) {
        self.push(Section::Statements { statements });
    }

    pub fn conditional(&mut self, conditional: Conditional) {
        self.statements(vec![Statement::Conditional(conditional)]);
    }

    pub fn list(&mut self, name: impl Into<String>, items: Vec<String>) {
        self.push(Section::List {
            name: name.into(),
            items,
        });
    }

    pub fn phony<I, S>(&mut self, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Section::Phony {
            targets: targets.into_iter().map(Into::into).collect(),
        });
    }

    pub fn rule(&mut self, rule: Rule) {
        self.push(Section::Rule { rule });
    }

    pub fn include(&mut self, optional: bool, pattern: impl Into<String>) {
        self.push(Section::Include {
            optional,
            pattern: pattern.into(),
        });
    }

    /// Find the rule producing `target`.
    pub fn find_rule(&self, target: &str) -> Option<&Rule> {
        self.sections.iter().find_map(|s| match s {
            Section::Rule { rule } if rule.target == target => Some(rule),
            _ => None,
        })
    }

    /// Find a top-level list by variable name.
    pub fn find_list(&self, name: &str) -> Option<&[String]> {
        self.sections.iter().find_map(|s| match s {
            Section::List { name: n, items } if n == name => Some(items.as_slice()),
            _ => None,
        })
    }

    /// Render to make syntax.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            render_section(section, &mut out);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Makefile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_section(section: &Section, out: &mut String) {
    match section {
        Section::Comment { lines } => {
            for line in lines {
                let _ = writeln!(out, "# {}", line);
            }
        }
        Section::Statements { statements } => {
            for statement in statements {
                match statement {
                    Statement::Assign(a) => a.render(out, ""),
                    Statement::Conditional(c) => c.render(out),
                    Statement::Export(var) => {
                        let _ = writeln!(out, "export {}", var);
                    }
                }
            }
        }
        Section::List { name, items } => {
            let _ = writeln!(out, "{} := \\", name);
            for item in items {
                let _ = writeln!(out, "\t{} \\", item);
            }
        }
        Section::Phony { targets } => {
            let _ = writeln!(out, ".PHONY: {}", targets.join(" "));
        }
        Section::Rule { rule } => rule.render(out),
        Section::Include { optional, pattern } => {
            let _ = writeln!(out, "{}include {}", if *optional { "-" } else { "" }, pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_conditional_block() {
        let mut mk = Makefile::new();
        mk.conditional(
            Conditional::new(Test::IfEq("$(CONFIG)".into(), "Debug".into()))
                .then(Assignment::simple("BINDIR", "../bin"))
                .then(Assignment::append("CFLAGS", "$(CPPFLAGS) -g"))
                .then(Assignment::simple("LDDEPS", "")),
        );

        assert_eq!(
            mk.render(),
            "ifeq ($(CONFIG),Debug)\n  BINDIR := ../bin\n  CFLAGS += $(CPPFLAGS) -g\n  LDDEPS :=\nendif\n\n"
        );
    }

    #[test]
    fn test_render_else_branch() {
        let mut mk = Makefile::new();
        mk.statements(vec![
            Statement::Assign(Assignment::simple("CMD", "$(COMSPEC)")),
            Statement::Conditional(
                Conditional::new(Test::IfEq("".into(), "$(CMD)".into()))
                    .then(Assignment::simple("MK", "mkdir -p x"))
                    .otherwise(Assignment::simple("MK", "mkdir x")),
            ),
        ]);

        assert_eq!(
            mk.render(),
            "CMD := $(COMSPEC)\nifeq (,$(CMD))\n  MK := mkdir -p x\nelse\n  MK := mkdir x\nendif\n\n"
        );
    }

    #[test]
    fn test_render_list_and_rule() {
        let mut mk = Makefile::new();
        mk.list("OBJECTS", vec!["$(OBJDIR)/a.o".into(), "$(OBJDIR)/b.o".into()]);
        mk.phony(["clean"]);
        mk.rule(
            Rule::new("$(OBJDIR)/a.o")
                .prerequisite("a.cpp")
                .command("@$(CXX) -c $<"),
        );
        mk.include(true, "$(OBJECTS:%.o=%.d)");

        assert_eq!(
            mk.render(),
            "OBJECTS := \\\n\t$(OBJDIR)/a.o \\\n\t$(OBJDIR)/b.o \\\n\n\
             .PHONY: clean\n\n\
             $(OBJDIR)/a.o: a.cpp\n\t@$(CXX) -c $<\n\n\
             -include $(OBJECTS:%.o=%.d)\n\n"
        );
    }

    #[test]
    fn test_lookup_helpers() {
        let mut mk = Makefile::new();
        mk.list("OBJECTS", vec!["a.o".into()]);
        mk.rule(Rule::new("clean").command("rm -f a.o"));

        assert_eq!(mk.find_list("OBJECTS"), Some(&["a.o".to_string()][..]));
        assert!(mk.find_list("RESOURCES").is_none());
        assert_eq!(mk.find_rule("clean").unwrap().recipe, ["rm -f a.o"]);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut mk = Makefile::new();
        mk.phony(["clean"]);
        let json = serde_json::to_value(&mk).unwrap();
        assert_eq!(json["sections"][0]["section"], "phony");
        assert_eq!(json["sections"][0]["targets"][0], "clean");
    }
}
