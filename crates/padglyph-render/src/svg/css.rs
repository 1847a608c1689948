//! Embedded `<style>` sheets
//!
//! Only compound selectors are matched: `*`, `tag`, `.class`, `#id` and
//! combinations like `path.accent`. Rules with combinators, attribute
//! selectors or pseudo-classes are dropped.

/// One selector in a rule's comma list
#[derive(Debug, Clone, PartialEq, Default)]
struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || text.contains(|c: char| c.is_whitespace() || "[]:>+~()".contains(c))
        {
            return None;
        }
        if text == "*" {
            return Some(Self::default());
        }

        let mut selector = Self::default();
        let head_end = text.find(['.', '#']).unwrap_or(text.len());
        let head = &text[..head_end];
        if !head.is_empty() && head != "*" {
            selector.tag = Some(head.to_string());
        }

        let mut rest = &text[head_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match marker {
                '.' => selector.classes.push(name.to_string()),
                _ => selector.id = Some(name.to_string()),
            }
            rest = &body[end..];
        }
        Some(selector)
    }

    fn specificity(&self) -> (usize, usize, usize) {
        (
            usize::from(self.id.is_some()),
            self.classes.len(),
            usize::from(self.tag.is_some()),
        )
    }

    fn matches(&self, tag: &str, id: Option<&str>, classes: &[&str]) -> bool {
        self.tag.as_deref().map_or(true, |t| t == tag)
            && self.id.as_deref().map_or(true, |i| Some(i) == id)
            && self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    selector: Selector,
    declarations: String,
}

/// Parsed stylesheet, in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    /// Parse stylesheet text; unusable rules and at-rules are dropped
    pub fn parse(text: &str) -> Self {
        let text = strip_comments(text);
        let mut rules = Vec::new();
        let mut rest = text.as_str();
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let selectors = rest[..open].trim();
            let declarations = rest[open + 1..open + close].trim();
            rest = &rest[open + close + 1..];

            if selectors.starts_with('@') {
                continue;
            }
            for selector in selectors.split(',').filter_map(Selector::parse) {
                rules.push(Rule {
                    selector,
                    declarations: declarations.to_string(),
                });
            }
        }
        Self { rules }
    }

    /// Append the rules of another `<style>` element
    pub fn extend(&mut self, other: StyleSheet) {
        self.rules.extend(other.rules);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declaration blocks matching an element, lowest precedence first
    pub fn matching(&self, tag: &str, id: Option<&str>, class: Option<&str>) -> Vec<&str> {
        let classes: Vec<&str> = class.map_or_else(Vec::new, |c| c.split_whitespace().collect());
        let mut hits: Vec<(_, usize, &str)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.selector.matches(tag, id, &classes))
            .map(|(order, rule)| (rule.selector.specificity(), order, rule.declarations.as_str()))
            .collect();
        hits.sort_by_key(|&(specificity, order, _)| (specificity, order));
        hits.into_iter().map(|(_, _, declarations)| declarations).collect()
    }
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors() {
        assert_eq!(
            Selector::parse("path.accent.dark"),
            Some(Selector {
                tag: Some("path".to_string()),
                id: None,
                classes: vec!["accent".to_string(), "dark".to_string()],
            })
        );
        assert_eq!(Selector::parse("#face").and_then(|s| s.id), Some("face".to_string()));
        assert_eq!(Selector::parse("*"), Some(Selector::default()));
        assert_eq!(Selector::parse("g path"), None);
        assert_eq!(Selector::parse("a:hover"), None);
        assert_eq!(Selector::parse(".a."), None);
    }

    #[test]
    fn test_cascade_order() {
        let sheet = StyleSheet::parse(
            "/* art */ #face { fill: red } .st0 { fill: blue }
             rect { fill: green; stroke: black }
             @media print { }
             .st0, .st1 { opacity: 0.5 }",
        );
        assert!(!sheet.is_empty());

        let hits = sheet.matching("rect", Some("face"), Some("st0 other"));
        assert_eq!(
            hits,
            vec!["fill: green; stroke: black", "fill: blue", "opacity: 0.5", "fill: red"]
        );

        assert_eq!(sheet.matching("circle", None, Some("st1")), vec!["opacity: 0.5"]);
        assert!(sheet.matching("circle", None, None).is_empty());
    }

    #[test]
    fn test_unterminated_comment() {
        let sheet = StyleSheet::parse(".a { fill: red } /* .b { fill: blue }");
        assert_eq!(sheet.matching("g", None, Some("b")), Vec::<&str>::new());
        assert_eq!(sheet.matching("g", None, Some("a")), vec!["fill: red"]);
    }
}
