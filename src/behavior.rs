use super::*;

pub const ENABLE_BUTTON_ID: &str = "enable_button";
pub const SCROLL_BUTTON_ID: &str = "scroll_button";
pub const TOGGLE_CLASS: &str = "click";
pub const ENABLED_ALERT_TEXT: &str = "Enabled!";
pub const EXPANDED_PAGE_HEIGHT: &str = "5000px";

/// The canonical document the wiring expects: a toggle trigger carrying the
/// `click` class, an enable button and a scroll button.
pub const DEMO_PAGE_HTML: &str = r#"
<html>
  <head><title>Demo Page</title></head>
  <body>
    <button class='click'>Click Me</button>
    <button id='enable_button'>Enable</button>
    <button id='scroll_button'>Scroll</button>
  </body>
</html>
"#;

/// Registers the page wiring to run when the load signal fires.
pub fn install_page_behavior(page: &mut Page) {
    page.on_load(wire_page);
}

/// Convenience: parse the canonical demo page, install the wiring and fire
/// the load signal.
pub fn open_demo_page() -> Result<Page> {
    let mut page = Page::from_html(DEMO_PAGE_HTML)?;
    install_page_behavior(&mut page);
    page.load()?;
    Ok(page)
}

/// Wires the page on load:
///
/// 1. starts the enable button disabled,
/// 2. flips that flag on every click of the first `.click` element,
/// 3. alerts `Enabled!` when the enable button is clicked (deliverable only
///    while enabled),
/// 4. expands the document root to a fixed height when the scroll button is
///    clicked.
///
/// Lookups happen in the order the elements are first needed. A missing
/// element halts the wiring at that point with `MissingElement`; listeners
/// registered before the failure stay active, matching how a browser would
/// abort the script mid-run.
fn wire_page(page: &mut Page) -> Result<()> {
    let enable_button = page.element_by_id(ENABLE_BUTTON_ID)?;
    page.set_node_disabled(enable_button, true)?;

    let toggle = page.first_by_class(TOGGLE_CLASS)?;
    page.add_node_listener(toggle, "click", move |page, _event| {
        let disabled = page.node_disabled(enable_button);
        page.set_node_disabled(enable_button, !disabled)
    });

    page.add_node_listener(enable_button, "click", |page, _event| {
        page.alert(ENABLED_ALERT_TEXT);
        Ok(())
    });

    let scroll_button = page.element_by_id(SCROLL_BUTTON_ID)?;
    page.add_node_listener(scroll_button, "click", |page, _event| {
        page.set_root_style("height", EXPANDED_PAGE_HEIGHT)
    });

    Ok(())
}
