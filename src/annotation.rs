//! Rule-based rewriting of highlighted markup.
//!
//! Highlighted HTML already carries the highlighter's idea of what each token
//! is (a function name, a string, a field), so hyperlinks can be injected by
//! matching that markup directly instead of re-parsing the source. Each rule
//! owns one or more regular expressions and a single replacement template that
//! refers to their capture groups (`$1`, `${1}`, `$name`).
//!
//! Rules are applied in declaration order, and each one operates on the output
//! of the previous one: a later rule is free to match markup that an earlier
//! rule inserted. Patterns that fail to compile are logged and dropped, the
//! remaining rules still run.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of patterns sharing one replacement template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRule {
    /// Regular expressions, matched case-insensitively in multi-line mode
    pub patterns: Vec<String>,
    /// Replacement template, expanded once per match
    pub replacement: String,
}

/// Something wrong with a rule, found by [`AnnotationRule::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleProblem {
    /// The pattern at this index doesn't compile
    InvalidPattern { pattern: usize, message: String },
    /// The replacement refers to a group the pattern at this index doesn't have
    MissingGroup { pattern: usize, group: String },
}

impl fmt::Display for RuleProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleProblem::InvalidPattern { pattern, message } => {
                write!(f, "pattern {pattern} is invalid: {message}")
            }
            RuleProblem::MissingGroup { pattern, group } => write!(
                f,
                "replacement refers to group `{group}` which pattern {pattern} doesn't capture"
            ),
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

impl AnnotationRule {
    pub fn new<I, P, R>(patterns: I, replacement: R) -> AnnotationRule
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
        R: Into<String>,
    {
        AnnotationRule {
            patterns: patterns.into_iter().map(Into::into).collect(),
            replacement: replacement.into(),
        }
    }

    /// Check every pattern of the rule, along with the group references of the
    /// replacement against each pattern's capture groups.
    pub fn validate(&self) -> Vec<RuleProblem> {
        let references = group_references(&self.replacement);
        let mut problems = Vec::new();

        for (i, pattern) in self.patterns.iter().enumerate() {
            let regex = match compile_pattern(pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    problems.push(RuleProblem::InvalidPattern {
                        pattern: i,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            for reference in references.iter() {
                let present = match reference.parse::<usize>() {
                    Ok(index) => index < regex.captures_len(),
                    Err(_) => regex
                        .capture_names()
                        .flatten()
                        .any(|name| name == reference),
                };
                if !present {
                    problems.push(RuleProblem::MissingGroup {
                        pattern: i,
                        group: reference.clone(),
                    });
                }
            }
        }

        problems
    }
}

/// Collect the group names and indices a replacement template refers to, using
/// the same syntax `regex` expands: `$$` is a literal dollar, `${name}` is
/// braced, and a bare `$name` takes the longest run of `[_0-9a-zA-Z]`.
fn group_references(replacement: &str) -> Vec<String> {
    let mut references = Vec::new();
    let mut rest = replacement;

    while let Some(at) = rest.find('$') {
        rest = &rest[at + 1..];

        if let Some(after) = rest.strip_prefix('$') {
            rest = after;
            continue;
        }

        if let Some(braced) = rest.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                if end > 0 {
                    references.push(braced[..end].to_string());
                }
                rest = &braced[end + 1..];
            }
            continue;
        }

        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end > 0 {
            references.push(rest[..end].to_string());
        }
        rest = &rest[end..];
    }

    references
}

#[derive(Debug)]
struct CompiledRule {
    regexes: Vec<Regex>,
    replacement: String,
}

/// A rule table compiled once and reused for every document.
#[derive(Debug, Default)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

impl CompiledRules {
    /// Compile every pattern of every rule. Patterns that don't compile are
    /// logged with their rule and pattern index and left out.
    pub fn compile(rules: &[AnnotationRule]) -> CompiledRules {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(ri, rule)| CompiledRule {
                regexes: rule
                    .patterns
                    .iter()
                    .enumerate()
                    .filter_map(|(pi, pattern)| match compile_pattern(pattern) {
                        Ok(regex) => Some(regex),
                        Err(e) => {
                            log::warn!(
                                "Skipping annotation rule {ri} pattern {pi} `{pattern}`: {e}"
                            );
                            None
                        }
                    })
                    .collect(),
                replacement: rule.replacement.clone(),
            })
            .collect();

        CompiledRules { rules }
    }

    /// Number of patterns that survived compilation
    pub fn pattern_count(&self) -> usize {
        self.rules.iter().map(|rule| rule.regexes.len()).sum()
    }

    /// Rewrite `markup` with every rule in order, each pass working on the
    /// output of the one before it.
    pub fn annotate(&self, markup: &str) -> String {
        let mut markup = markup.to_string();
        for rule in self.rules.iter() {
            for regex in rule.regexes.iter() {
                let replaced = regex
                    .replace_all(&markup, rule.replacement.as_str())
                    .into_owned();
                markup = replaced;
            }
        }
        markup
    }
}

/// One-shot annotation: compile `rules` and apply them to `markup`.
#[cfg(test)]
pub fn annotate(markup: &str, rules: &[AnnotationRule]) -> String {
    CompiledRules::compile(rules).annotate(markup)
}

/// The rules used when the configuration doesn't supply any: link the
/// experience and contact listings to their pages, turn the e-mail address into
/// a `mailto:` link and make quoted URLs clickable.
pub fn default_rules() -> Vec<AnnotationRule> {
    // the highlighter leaves bare identifiers unwrapped, so the span around the
    // linked name is optional
    vec![
        AnnotationRule::new(
            [r#"(<span class="nx">Experience</span><span class="p">:</span>\s*(?:<span class="n[fx]">)?)(ListExperience)((?:</span>)?)"#],
            r#"$1<a href="experience.html" title="Expand experience list" class="nf">$2</a>$3"#,
        ),
        AnnotationRule::new(
            [r#"(<span class="nx">ContactOptions</span><span class="p">:</span>\s*(?:<span class="n[fx]">)?)(ListContactOptions)((?:</span>)?)"#],
            r#"$1<a href="contact.html" title="See contact options" class="nf">$2</a>$3"#,
        ),
        AnnotationRule::new(
            [r#"(rdominguez@tecnologer\.net)"#],
            r#"<a href="mailto:${1}" class="s">${1}</a>"#,
        ),
        AnnotationRule::new(
            [r#"(<span class="s">")(http(s)?://[^"<]+)("</span>)"#],
            r#"$1<a href="$2" class="s">${2}</a>$4"#,
        ),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    fn rule(pattern: &str, replacement: &str) -> AnnotationRule {
        AnnotationRule::new([pattern], replacement)
    }

    #[test]
    fn no_match_returns_input_unchanged() {
        let markup = r#"<span class="k">package</span> main"#;
        let rules = vec![rule("(nothing here)", "<b>$1</b>")];
        assert_eq!(annotate(markup, &rules), markup);
        assert_eq!(annotate(markup, &[]), markup);
    }

    #[test]
    fn replaces_every_match_with_groups() {
        let markup = "call foo and foo again";
        let rules = vec![rule("(foo)", r#"<a href="$1.html">${1}</a>"#)];
        assert_eq!(
            annotate(markup, &rules),
            r#"call <a href="foo.html">foo</a> and <a href="foo.html">foo</a> again"#
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_multi_line() {
        let markup = "first\nHELLO world\nhello there";
        let rules = vec![rule("^(hello)", "[$1]")];
        assert_eq!(annotate(markup, &rules), "first\n[HELLO] world\n[hello] there");
    }

    #[test]
    fn rules_apply_cumulatively_in_order() {
        // rule 2 only matches the anchor inserted by rule 1
        let link = rule("(home)", r#"<a href="index.html">$1</a>"#);
        let mark = rule(r#"(<a href="index.html">)"#, r#"<mark>$1"#);
        let markup = "go home";

        let in_order = annotate(markup, &[link.clone(), mark.clone()]);
        let reversed = annotate(markup, &[mark, link]);

        assert_eq!(in_order, r#"go <mark><a href="index.html">home</a>"#);
        assert_eq!(reversed, r#"go <a href="index.html">home</a>"#);
        assert!(in_order.matches("<mark>").count() > reversed.matches("<mark>").count());
    }

    #[test]
    fn patterns_within_a_rule_share_the_replacement() {
        let shared = AnnotationRule::new(["(alpha)", "(beta)"], "<i>$1</i>");
        assert_eq!(annotate("alpha beta", &[shared]), "<i>alpha</i> <i>beta</i>");
    }

    #[test]
    fn malformed_pattern_is_skipped() {
        let valid = rule("(ok)", "<b>$1</b>");
        let broken = rule("(unclosed", "<b>$1</b>");
        let markup = "this is ok";

        let with_broken = annotate(markup, &[broken.clone(), valid.clone()]);
        let alone = annotate(markup, &[valid]);
        assert_eq!(with_broken, alone);
        assert_eq!(alone, "this is <b>ok</b>");

        let compiled = CompiledRules::compile(&[broken]);
        assert_eq!(compiled.pattern_count(), 0);
    }

    #[test]
    fn can_find_group_references() {
        assert_eq!(group_references("$1<a>$2</a>$3"), vec!["1", "2", "3"]);
        assert_eq!(group_references("${1}x${name}"), vec!["1", "name"]);
        assert_eq!(group_references("$$1 costs $"), Vec::<String>::new());
        assert_eq!(group_references("$1x"), vec!["1x"]);
    }

    #[test]
    fn validate_reports_problems() {
        let good = rule("(a)(b)", "$2$1");
        assert!(good.validate().is_empty());

        let missing = rule("(a)", "$1$2");
        assert_eq!(
            missing.validate(),
            vec![RuleProblem::MissingGroup {
                pattern: 0,
                group: "2".to_string()
            }]
        );

        let named = rule("(?P<user>[a-z]+)@", "${user} ${host}");
        assert_eq!(named.validate().len(), 1);

        let invalid = rule("([a-", "$1");
        assert!(matches!(
            invalid.validate().as_slice(),
            [RuleProblem::InvalidPattern { pattern: 0, .. }]
        ));
    }

    #[test]
    fn default_rules_are_valid() {
        for (i, rule) in default_rules().iter().enumerate() {
            assert!(rule.validate().is_empty(), "rule {i}: {:?}", rule.validate());
        }
    }

    #[test]
    fn default_rules_link_highlighted_markup() {
        let markup = concat!(
            r#"<span class="nx">Experience</span><span class="p">:</span> "#,
            r#"<span class="nf">ListExperience</span><span class="p">,</span>"#,
            "\n",
            r#"<span class="nx">Email</span><span class="p">:</span> "#,
            r#"<span class="s">"rdominguez@tecnologer.net"</span>"#,
            "\n",
            r#"<span class="nx">Site</span><span class="p">:</span> "#,
            r#"<span class="s">"https://tecnologer.net"</span>"#,
        );

        let annotated = annotate(markup, &default_rules());

        assert!(annotated.contains(
            r#"<span class="nf"><a href="experience.html" title="Expand experience list" class="nf">ListExperience</a></span>"#
        ));
        assert!(annotated.contains(
            r#""<a href="mailto:rdominguez@tecnologer.net" class="s">rdominguez@tecnologer.net</a>""#
        ));
        assert!(annotated.contains(
            r#"<span class="s">"<a href="https://tecnologer.net" class="s">https://tecnologer.net</a>"</span>"#
        ));
    }

    #[test]
    fn default_rules_link_bare_identifiers() {
        let markup = concat!(
            r#"<span class="nx">ContactOptions</span><span class="p">:</span> "#,
            r#"ListContactOptions<span class="p">,</span>"#,
        );
        assert_eq!(
            annotate(markup, &default_rules()),
            concat!(
                r#"<span class="nx">ContactOptions</span><span class="p">:</span> "#,
                r#"<a href="contact.html" title="See contact options" class="nf">ListContactOptions</a>"#,
                r#"<span class="p">,</span>"#,
            )
        );
    }

    #[test]
    fn default_rules_link_highlighted_go() {
        use crate::config::SyntaxTheme;
        use crate::highlight::{Highlight, SyntectHighlighter};

        let source = concat!(
            "package main\n",
            "\n",
            "var Me = Profile{\n",
            "\tExperience:     ListExperience,\n",
            "\tContactOptions: ListContactOptions,\n",
            "\tEmail:          \"rdominguez@tecnologer.net\",\n",
            "\tSite:           \"https://tecnologer.net\",\n",
            "}\n",
        );
        let highlighter = SyntectHighlighter::new(SyntaxTheme::default()).expect("can load assets");
        let html = highlighter.highlight(source, "Go").expect("can highlight go");

        let annotated = annotate(&html, &default_rules());

        assert!(
            annotated.contains(r#"<a href="experience.html" title="Expand experience list" class="nf">ListExperience</a>"#),
            "{annotated}"
        );
        assert!(
            annotated.contains(r#"<a href="contact.html" title="See contact options" class="nf">ListContactOptions</a>"#),
            "{annotated}"
        );
        assert!(
            annotated.contains(r#"<a href="mailto:rdominguez@tecnologer.net" class="s">"#),
            "{annotated}"
        );
        assert!(
            annotated.contains(r#"<a href="https://tecnologer.net" class="s">https://tecnologer.net</a>"#),
            "{annotated}"
        );
    }
}
