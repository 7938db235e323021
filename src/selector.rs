use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) universal: bool,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if self.tag.is_none() && self.classes.is_empty() && !self.universal {
            self.id.as_deref()
        } else {
            None
        }
    }
}

/// Parses a comma-separated selector list where each group is a single
/// compound step: `tag`, `#id`, `.class`, `*`, or a combination. Anything
/// with combinators, attribute conditions or pseudo-classes is rejected.
pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<SelectorStep>> {
    let mut groups = Vec::new();
    for group in selector.split(',') {
        let group = group.trim();
        if group.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        groups.push(parse_step(selector, group)?);
    }
    Ok(groups)
}

fn parse_step(full_selector: &str, group: &str) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    let mut chars = group.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '#' => {
                chars.next();
                let name = take_name(&mut chars);
                if name.is_empty() || step.id.is_some() {
                    return Err(Error::UnsupportedSelector(full_selector.to_string()));
                }
                step.id = Some(name);
            }
            '.' => {
                chars.next();
                let name = take_name(&mut chars);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(full_selector.to_string()));
                }
                step.classes.push(name);
            }
            '*' => {
                chars.next();
                if step.universal || step.tag.is_some() {
                    return Err(Error::UnsupportedSelector(full_selector.to_string()));
                }
                step.universal = true;
            }
            ch if is_name_char(ch) => {
                let name = take_name(&mut chars);
                if step.tag.is_some() || step.universal || step.id.is_some()
                    || !step.classes.is_empty()
                {
                    return Err(Error::UnsupportedSelector(full_selector.to_string()));
                }
                step.tag = Some(name.to_ascii_lowercase());
            }
            _ => {
                // Combinators, attribute selectors and pseudo-classes land here.
                return Err(Error::UnsupportedSelector(full_selector.to_string()));
            }
        }
    }

    if step == SelectorStep::default() {
        return Err(Error::UnsupportedSelector(full_selector.to_string()));
    }
    Ok(step)
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&ch) = chars.peek() {
        if is_name_char(ch) {
            name.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

pub(crate) fn matches_step(dom: &Dom, node_id: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if let Some(tag) = &step.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if let Some(id) = &step.id {
        if element.attrs.get("id") != Some(id) {
            return false;
        }
    }

    step.classes
        .iter()
        .all(|class_name| has_class(element, class_name))
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 {
            if let Some(id) = groups[0].id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);

        Ok(ids
            .into_iter()
            .filter(|candidate| {
                groups
                    .iter()
                    .any(|step| matches_step(self, *candidate, step))
            })
            .collect())
    }
}
