//! JavaScript run inside the page.
//!
//! Strings are embedded as JSON literals, never spliced in raw.

use serde_json::Value;

/// Name of the binding the mutation observer reports through.
pub(crate) const MUTATION_BINDING: &str = "__flowpilotMutations";

pub(crate) const URL: &str = "location.href";
pub(crate) const TITLE: &str = "document.title";
pub(crate) const PAGE_TEXT: &str = "document.body ? document.body.innerText : ''";
pub(crate) const GLOBAL_NAMES: &str = "Object.keys(window)";
pub(crate) const STORAGE_ENTRIES: &str =
    "Object.keys(localStorage).map(k => [k, localStorage.getItem(k) || ''])";

pub(crate) const PROPERTY: &str = "function(key) { return this[key]; }";
pub(crate) const IS_CALLABLE: &str = "function(name) { return typeof this[name] === 'function'; }";
pub(crate) const IS_FUNCTION: &str = "function() { return typeof this === 'function'; }";
pub(crate) const ASSIGN: &str = "function(key, value) { this[key] = value; }";

/// Awaits the call and copies the result out; uncopyable results become null.
pub(crate) const INVOKE: &str = r#"async function(name, args) {
  const out = await this[name](...args);
  if (out === undefined) return null;
  try { return JSON.parse(JSON.stringify(out)); } catch (e) { return null; }
}"#;

pub(crate) const SNAPSHOT: &str = r#"function() {
  try { return JSON.parse(JSON.stringify(this)); } catch (e) { return null; }
}"#;

fn literal(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

pub(crate) fn global(name: &str) -> String {
    format!("globalThis[{}]", literal(name))
}

pub(crate) fn query_all(selector: &str) -> String {
    format!(
        r#"Array.from(document.querySelectorAll({})).map(el => {{
  const attributes = {{}};
  for (const a of el.attributes) attributes[a.name] = a.value;
  const label = el.querySelector('.node-name');
  return {{
    tag: el.tagName.toLowerCase(),
    attributes,
    text: el.textContent || '',
    value: typeof el.value === 'string' ? el.value : null,
    transform: el.style && el.style.transform ? el.style.transform : null,
    label: label ? label.textContent : null,
  }};
}})"#,
        literal(selector)
    )
}

pub(crate) fn element_component(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({});
  if (!el) return null;
  return el.__vue__ || (el.__vueParentComponent && el.__vueParentComponent.proxy) || null;
}})()"#,
        literal(selector)
    )
}

pub(crate) fn first_component(with_property: Option<&str>) -> String {
    let property = with_property.map_or_else(|| "null".to_string(), literal);
    format!(
        r#"(() => {{
  const property = {};
  for (const el of document.querySelectorAll('*')) {{
    const component = el.__vue__;
    if (component && (property === null || property in component)) return component;
  }}
  return null;
}})()"#,
        property
    )
}

pub(crate) fn fetch_json(path: &str) -> String {
    format!(
        r#"fetch({}, {{ credentials: 'include', headers: {{ 'Accept': 'application/json' }} }})
  .then(r => {{ if (!r.ok) throw new Error(r.status + ' ' + r.statusText); return r.json(); }})"#,
        literal(path)
    )
}

/// Installs one observer over the body. Returns false when already installed.
pub(crate) fn mutation_observer() -> String {
    format!(
        r#"(() => {{
  if (window.__flowpilotObserver) return false;
  const binding = {binding};
  const describe = el => ({{
    classes: Array.from(el.classList || []),
    attributes: Array.from(el.attributes || []).map(a => a.name),
    hasWorkflowDescendant: !!(el.querySelector && el.querySelector('[data-workflow]')),
  }});
  const observer = new MutationObserver(records => {{
    const batch = records.map(r => r.type === 'attributes'
      ? {{ kind: 'attributes', attributeName: r.attributeName, targetClasses: Array.from(r.target.classList || []), added: [] }}
      : {{ kind: 'childList', attributeName: null, targetClasses: [], added: Array.from(r.addedNodes).filter(n => n.nodeType === 1).map(describe) }});
    if (typeof window[binding] === 'function') window[binding](JSON.stringify(batch));
  }});
  observer.observe(document.body, {{
    childList: true,
    subtree: true,
    attributes: true,
    attributeFilter: ['data-workflow', 'data-nodes', 'data-connections', 'class'],
  }});
  window.__flowpilotObserver = observer;
  return true;
}})()"#,
        binding = literal(MUTATION_BINDING)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_escaped() {
        let script = query_all(r#"[data-test-id="canvas-plus-button"]"#);
        assert!(script.contains(r#"querySelectorAll("[data-test-id=\"canvas-plus-button\"]")"#));
    }

    #[test]
    fn test_global_lookup() {
        assert_eq!(global("$n8n"), r#"globalThis["$n8n"]"#);
    }

    #[test]
    fn test_first_component_property() {
        assert!(first_component(Some("$store")).contains(r#"const property = "$store";"#));
        assert!(first_component(None).contains("const property = null;"));
    }

    #[test]
    fn test_observer_reports_through_binding() {
        let script = mutation_observer();
        assert!(script.contains(r#"const binding = "__flowpilotMutations";"#));
        assert!(script.contains("'data-connections'"));
    }
}
