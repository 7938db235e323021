use super::*;

#[test]
fn demo_page_loads_with_enable_button_disabled() -> Result<()> {
    let page = open_demo_page()?;
    page.assert_disabled("#enable_button", true)?;
    page.assert_alerts(&[])?;
    Ok(())
}

#[test]
fn toggle_click_enables_the_button() -> Result<()> {
    let mut page = open_demo_page()?;
    page.click(".click")?;
    page.assert_disabled("#enable_button", false)?;
    Ok(())
}

#[test]
fn enabled_button_click_raises_exactly_one_alert() -> Result<()> {
    let mut page = open_demo_page()?;
    page.click(".click")?;
    page.click("#enable_button")?;
    page.assert_alerts(&[ENABLED_ALERT_TEXT])?;
    Ok(())
}

#[test]
fn disabled_button_click_raises_no_alert() -> Result<()> {
    let mut page = open_demo_page()?;
    page.click("#enable_button")?;
    page.assert_alerts(&[])?;
    Ok(())
}

#[test]
fn scroll_click_expands_the_document_root() -> Result<()> {
    let mut page = open_demo_page()?;
    page.assert_root_style("height", "")?;
    page.click("#scroll_button")?;
    page.assert_root_style("height", EXPANDED_PAGE_HEIGHT)?;

    // Idempotent: repeat clicks keep the same literal value.
    page.click("#scroll_button")?;
    page.click("#scroll_button")?;
    page.assert_root_style("height", EXPANDED_PAGE_HEIGHT)?;
    Ok(())
}

#[test]
fn toggle_parity_controls_the_disabled_flag() -> Result<()> {
    let mut page = open_demo_page()?;
    for clicks in 1..=10u32 {
        page.click(".click")?;
        page.assert_disabled("#enable_button", clicks % 2 == 0)?;
    }
    Ok(())
}

#[test]
fn only_the_first_click_classed_element_is_wired() -> Result<()> {
    let html = r#"
        <html><body>
          <span class='click'>first</span>
          <span class='click'>second</span>
          <button id='enable_button'>Enable</button>
          <button id='scroll_button'>Scroll</button>
        </body></html>
    "#;
    let mut page = Page::from_html(html)?;
    install_page_behavior(&mut page);
    page.load()?;

    // Dispatching on the second carrier reaches no listener; the spans are
    // siblings, so nothing bubbles into the wired one either.
    let second = page.dom.elements_by_class_name(TOGGLE_CLASS)[1];
    page.dispatch_event(second, "click")?;
    page.assert_disabled("#enable_button", true)?;

    page.click(".click")?;
    page.assert_disabled("#enable_button", false)?;
    Ok(())
}

#[test]
fn missing_scroll_button_halts_wiring_after_earlier_listeners() -> Result<()> {
    let html = r#"
        <html><body>
          <button class='click'>Click Me</button>
          <button id='enable_button'>Enable</button>
        </body></html>
    "#;
    let mut page = Page::from_html(html)?;
    install_page_behavior(&mut page);

    let err = page.load().unwrap_err();
    assert_eq!(err, Error::MissingElement("scroll_button".to_string()));

    // Wiring performed before the failure point survives.
    page.assert_disabled("#enable_button", true)?;
    page.click(".click")?;
    page.assert_disabled("#enable_button", false)?;
    page.click("#enable_button")?;
    page.assert_alerts(&[ENABLED_ALERT_TEXT])?;
    Ok(())
}

#[test]
fn missing_enable_button_fails_before_any_wiring() -> Result<()> {
    let html = r#"
        <html><body>
          <button class='click'>Click Me</button>
          <button id='scroll_button'>Scroll</button>
        </body></html>
    "#;
    let mut page = Page::from_html(html)?;
    install_page_behavior(&mut page);

    let err = page.load().unwrap_err();
    assert_eq!(err, Error::MissingElement("enable_button".to_string()));

    // Nothing was registered: the toggle click reaches no listener.
    page.click(".click")?;
    page.assert_root_style("height", "")?;
    page.click("#scroll_button")?;
    page.assert_root_style("height", "")?;
    Ok(())
}

#[test]
fn missing_toggle_element_halts_after_initial_disable() -> Result<()> {
    let html = r#"
        <html><body>
          <button id='enable_button'>Enable</button>
          <button id='scroll_button'>Scroll</button>
        </body></html>
    "#;
    let mut page = Page::from_html(html)?;
    install_page_behavior(&mut page);

    let err = page.load().unwrap_err();
    assert_eq!(err, Error::MissingElement(".click".to_string()));
    page.assert_disabled("#enable_button", true)?;

    // The enable listener was never registered.
    page.set_disabled("#enable_button", false)?;
    page.click("#enable_button")?;
    page.assert_alerts(&[])?;
    Ok(())
}

#[test]
fn load_fires_at_most_once() -> Result<()> {
    let mut page = open_demo_page()?;
    assert!(page.loaded());

    page.click(".click")?;
    page.assert_disabled("#enable_button", false)?;

    // A repeat load must not re-run the wiring and reset the flag.
    page.load()?;
    page.assert_disabled("#enable_button", false)?;
    Ok(())
}

#[test]
fn parser_builds_nested_tree_with_text() -> Result<()> {
    let html = "<div id='outer'>a<span id='inner'>b</span>c</div>";
    let page = Page::from_html(html)?;
    page.assert_text("#outer", "abc")?;
    page.assert_text("#inner", "b")?;
    assert_eq!(page.text("#outer")?, "abc");
    Ok(())
}

#[test]
fn parser_accepts_all_attribute_quoting_styles() -> Result<()> {
    let html = r#"<input id="a" type='text' name=field disabled>"#;
    let page = Page::from_html(html)?;
    page.assert_exists("#a")?;
    page.assert_disabled("#a", true)?;
    Ok(())
}

#[test]
fn parser_skips_comments_and_doctype() -> Result<()> {
    let html = "<!DOCTYPE html><!-- note --><p id='p'>ok</p>";
    let page = Page::from_html(html)?;
    page.assert_text("#p", "ok")?;
    Ok(())
}

#[test]
fn parser_keeps_script_text_inert() -> Result<()> {
    let html = r#"
        <p id='p'>before</p>
        <script>document.getElementById('p').textContent = '<after>';</script>
    "#;
    let page = Page::from_html(html)?;
    page.assert_text("#p", "before")?;
    page.assert_text_contains("script", "<after>")?;
    Ok(())
}

#[test]
fn parser_keeps_lookalike_end_tags_in_script_text() -> Result<()> {
    // "</scripts>" is body text; only a real "</script>" close counts.
    let html = r#"
        <script>var tags = '</scripts>';</script>
        <p id='after'>done</p>
    "#;
    let page = Page::from_html(html)?;
    page.assert_text_contains("script", "</scripts>")?;
    page.assert_text("#after", "done")?;
    Ok(())
}

#[test]
fn parser_rejects_unclosed_comment() {
    let err = Page::from_html("<!-- never closed").err().unwrap();
    assert_eq!(err, Error::HtmlParse("unclosed HTML comment".to_string()));
}

#[test]
fn parser_rejects_unclosed_start_tag() {
    let err = Page::from_html("<div id='x'").err().unwrap();
    assert_eq!(err, Error::HtmlParse("unclosed start tag".to_string()));
}

#[test]
fn duplicate_ids_resolve_to_first_in_document_order() -> Result<()> {
    let html = "<p id='dup'>one</p><p id='dup'>two</p>";
    let page = Page::from_html(html)?;
    page.assert_text("#dup", "one")?;
    Ok(())
}

#[test]
fn selector_subset_matches_tag_id_class_and_groups() -> Result<()> {
    let html = r#"
        <div id='a' class='x y'>A</div>
        <span class='x'>B</span>
    "#;
    let page = Page::from_html(html)?;
    page.assert_exists("div")?;
    page.assert_exists("#a")?;
    page.assert_exists(".x.y")?;
    page.assert_exists("div.x")?;
    page.assert_exists("#a.x")?;
    page.assert_exists("section, span")?;
    page.assert_text(".y", "A")?;
    Ok(())
}

#[test]
fn selector_combinators_are_unsupported() -> Result<()> {
    let page = Page::from_html("<div><p>x</p></div>")?;
    for selector in ["div p", "div > p", "p:first-child", "[id]", "p + p"] {
        let err = page.assert_exists(selector).unwrap_err();
        assert_eq!(err, Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(())
}

#[test]
fn selector_miss_reports_not_found() -> Result<()> {
    let page = Page::from_html("<div>x</div>")?;
    let err = page.assert_exists("#nope").unwrap_err();
    assert_eq!(err, Error::SelectorNotFound("#nope".to_string()));
    Ok(())
}

#[test]
fn style_set_and_get_round_trip_the_attribute() -> Result<()> {
    let mut page = Page::from_html("<div id='d' style='color: red; height: 10px'>x</div>")?;
    page.assert_style("#d", "height", "10px")?;

    page.set_style("#d", "height", "20px")?;
    page.assert_style("#d", "height", "20px")?;
    page.assert_style("#d", "color", "red")?;

    // Overwrites must not duplicate the declaration.
    let dump = page.dump_dom("#d")?;
    assert_eq!(dump.matches("height").count(), 1);

    page.set_style("#d", "height", "")?;
    page.assert_style("#d", "height", "")?;
    page.assert_style("#d", "color", "red")?;
    Ok(())
}

#[test]
fn camel_case_style_props_map_to_css_names() -> Result<()> {
    let mut page = Page::from_html("<div id='d'>x</div>")?;
    page.set_style("#d", "maxHeight", "5px")?;
    page.assert_style("#d", "max-height", "5px")?;
    let dump = page.dump_dom("#d")?;
    assert!(dump.contains("max-height: 5px;"), "dump was {dump}");
    Ok(())
}

#[test]
fn click_events_capture_then_bubble_through_ancestors() -> Result<()> {
    let mut page = Page::from_html("<div id='outer'><button id='inner'>x</button></div>")?;
    let outer = page.element_by_id("outer")?;
    let inner = page.element_by_id("inner")?;

    // The alert log doubles as an ordered recorder here.
    page.add_capture_listener(outer, "click", |page, _event| {
        page.alert("outer-capture");
        Ok(())
    });
    page.add_node_listener(outer, "click", |page, _event| {
        page.alert("outer-bubble");
        Ok(())
    });
    page.add_node_listener(inner, "click", |page, _event| {
        page.alert("inner");
        Ok(())
    });

    page.click("#inner")?;
    page.assert_alerts(&["outer-capture", "inner", "outer-bubble"])?;
    Ok(())
}

#[test]
fn stop_propagation_halts_the_bubble_phase() -> Result<()> {
    let mut page = Page::from_html("<div id='outer'><button id='inner'>x</button></div>")?;
    let outer = page.element_by_id("outer")?;
    let inner = page.element_by_id("inner")?;

    page.add_node_listener(inner, "click", |page, event| {
        event.stop_propagation();
        page.alert("inner");
        Ok(())
    });
    page.add_node_listener(outer, "click", |page, _event| {
        page.alert("outer");
        Ok(())
    });

    page.click("#inner")?;
    page.assert_alerts(&["inner"])?;
    Ok(())
}

#[test]
fn stop_immediate_propagation_skips_later_listeners_on_the_node() -> Result<()> {
    let mut page = Page::from_html("<button id='b'>x</button>")?;
    let button = page.element_by_id("b")?;

    page.add_node_listener(button, "click", |page, event| {
        event.stop_immediate_propagation();
        page.alert("first");
        Ok(())
    });
    page.add_node_listener(button, "click", |page, _event| {
        page.alert("second");
        Ok(())
    });

    page.click("#b")?;
    page.assert_alerts(&["first"])?;
    Ok(())
}

#[test]
fn removed_listeners_no_longer_fire() -> Result<()> {
    let mut page = Page::from_html("<button id='b'>x</button>")?;
    let listener = page.add_listener("#b", "click", |page, _event| {
        page.alert("fired");
        Ok(())
    })?;

    page.click("#b")?;
    assert!(page.remove_listener(listener));
    assert!(!page.remove_listener(listener));
    page.click("#b")?;

    page.assert_alerts(&["fired"])?;
    Ok(())
}

#[test]
fn clicks_on_disabled_elements_dispatch_nothing() -> Result<()> {
    let mut page = Page::from_html("<button id='b' disabled>x</button>")?;
    page.add_listener("#b", "click", |page, _event| {
        page.alert("fired");
        Ok(())
    })?;

    page.click("#b")?;
    page.assert_alerts(&[])?;

    page.set_disabled("#b", false)?;
    page.click("#b")?;
    page.assert_alerts(&["fired"])?;
    Ok(())
}

#[test]
fn handler_errors_propagate_out_of_dispatch() -> Result<()> {
    let mut page = Page::from_html("<button id='b'>x</button>")?;
    page.add_listener("#b", "click", |_page, _event| {
        Err(Error::Runtime("handler exploded".into()))
    })?;

    let err = page.click("#b").unwrap_err();
    assert_eq!(err, Error::Runtime("handler exploded".to_string()));
    Ok(())
}

#[test]
fn text_match_checks_use_regex_patterns() -> Result<()> {
    let page = Page::from_html("<p id='p'>Enabled!</p>")?;
    page.assert_text_matches("#p", r"^Enab\w+!$")?;
    page.assert_text_contains("#p", "abled")?;
    page.assert_text_excludes("#p", "Disabled")?;

    let err = page.assert_text_matches("#p", r"^\d+$").unwrap_err();
    assert!(matches!(err, Error::AssertionFailed { .. }));

    let err = page.assert_text_matches("#p", "(unclosed").unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
    Ok(())
}

#[test]
fn assertion_failures_carry_a_dom_snippet() -> Result<()> {
    let page = Page::from_html("<button id='b' disabled>x</button>")?;
    let err = page.assert_disabled("#b", false).unwrap_err();
    match err {
        Error::AssertionFailed { dom_snippet, .. } => {
            assert!(dom_snippet.contains("<button"), "snippet was {dom_snippet}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn trace_log_records_dispatch_and_alerts() -> Result<()> {
    let mut page = open_demo_page()?;
    page.enable_trace(true);
    page.set_trace_stderr(false);

    page.click(".click")?;
    page.click("#enable_button")?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[event] click")));
    assert!(logs.iter().any(|line| line == "[alert] Enabled!"));
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_log_limit_drops_oldest_entries() -> Result<()> {
    let mut page = open_demo_page()?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.set_trace_log_limit(2)?;
    assert_eq!(
        page.set_trace_log_limit(0).unwrap_err(),
        Error::Runtime("set_trace_log_limit requires at least 1 entry".to_string())
    );

    for _ in 0..5 {
        page.click("#scroll_button")?;
    }
    assert_eq!(page.take_trace_logs().len(), 2);
    Ok(())
}
