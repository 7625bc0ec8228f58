//! HTML rendering of a dashboard [`Layout`].
//!
//! The page is self-contained: inline CSS and a small script. Charts are
//! `<img>` elements pointing at the SVG endpoint; on a selection change the
//! script refetches every panel bound to the selection and patches only that
//! panel's region.

use crate::chart::ChartData;
use crate::dashboard::{Layout, PanelOutput, Region};

/// Render the landing page listing the mounted dashboards.
pub fn render_index(dashboards: &[(&str, &str)]) -> String {
    let items: String = dashboards
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<li><a href="/{id}">{title}</a></li>"#,
                id = escape_html(id),
                title = escape_html(title)
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Dashboards</title>
    <style>{css}</style>
</head>
<body>
    <nav class="navbar"><span class="brand">Dashboards</span></nav>
    <main><ul class="index">{items}</ul></main>
</body>
</html>"#,
        css = inline_css(),
        items = items,
    )
}

/// Render the page of one dashboard.
pub fn render_dashboard(layout: &Layout) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body data-dashboard="{id}">
    <nav class="navbar"><a class="brand" href="/">{brand}</a></nav>
    <main>
        {control}
        {sections}
    </main>
    <script>{js}</script>
</body>
</html>"#,
        title = escape_html(&layout.title),
        id = escape_html(&layout.id),
        brand = escape_html(&layout.brand),
        css = inline_css(),
        js = inline_javascript(),
        control = render_control(layout),
        sections = render_sections(layout),
    )
}

fn render_control(layout: &Layout) -> String {
    let control = &layout.selection;
    let options: String = control
        .options
        .iter()
        .map(|opt| {
            let selected = if *opt == control.value { " selected" } else { "" };
            format!(
                r#"<option value="{v}"{selected}>{v}</option>"#,
                v = escape_html(opt),
                selected = selected
            )
        })
        .collect();
    format!(
        r#"<div class="control"><label for="{id}">{label}</label><select id="{id}">{options}</select></div>"#,
        id = escape_html(&control.id),
        label = escape_html(&control.label),
        options = options,
    )
}

fn render_sections(layout: &Layout) -> String {
    layout
        .sections()
        .into_iter()
        .map(|section| {
            let regions: Vec<&Region> = layout
                .regions
                .iter()
                .filter(|r| r.panel.section == section)
                .collect();
            let body = if regions.iter().any(|r| r.panel.tab.is_some()) {
                render_tabs(layout, &regions)
            } else {
                regions
                    .iter()
                    .map(|r| render_region(layout, r))
                    .collect::<String>()
            };
            format!(
                r#"<section><h3>{heading}</h3><div class="row">{body}</div></section>"#,
                heading = escape_html(section),
                body = body
            )
        })
        .collect()
}

fn render_tabs(layout: &Layout, regions: &[&Region]) -> String {
    let mut buttons = String::new();
    let mut panes = String::new();
    let mut untabbed = String::new();
    for region in regions {
        match region.panel.tab {
            Some(tab) => {
                let active = if buttons.is_empty() { " active" } else { "" };
                buttons.push_str(&format!(
                    r#"<button class="tab{active}" data-tab="{key}">{label}</button>"#,
                    active = active,
                    key = region.panel.key,
                    label = escape_html(tab)
                ));
                panes.push_str(&format!(
                    r#"<div class="pane{active}" data-pane="{key}">{region}</div>"#,
                    active = active,
                    key = region.panel.key,
                    region = render_region(layout, region)
                ));
            }
            None => untabbed.push_str(&render_region(layout, region)),
        }
    }
    format!(
        r#"<div class="tabs"><div class="tab-bar">{buttons}</div>{panes}</div>{untabbed}"#,
        buttons = buttons,
        panes = panes,
        untabbed = untabbed
    )
}

fn render_region(layout: &Layout, region: &Region) -> String {
    let key = region.panel.key;
    let reactive = if region.panel.reactive { "true" } else { "false" };
    let content = match &region.initial {
        PanelOutput::Card(card) => format!(
            r#"<div class="card-header">{header}</div><div class="card-body" data-value>{display}</div>"#,
            header = escape_html(&card.header),
            display = escape_html(&card.display)
        ),
        PanelOutput::Chart(spec) if region.svg => format!(
            r#"<img alt="{title}" src="/api/{id}/svg/{key}?country={country}">"#,
            title = escape_html(&spec.title),
            id = escape_html(&layout.id),
            key = key,
            country = escape_html(&encode_query(&layout.selection.value))
        ),
        PanelOutput::Chart(spec) => render_grid_table(&spec.title, &spec.data),
    };
    let class = match region.initial {
        PanelOutput::Card(_) => "card",
        PanelOutput::Chart(_) => "chart",
    };
    format!(
        r#"<div class="{class}" id="panel-{key}" data-key="{key}" data-reactive="{reactive}" data-svg="{svg}">{content}</div>"#,
        class = class,
        key = key,
        reactive = reactive,
        svg = region.svg,
        content = content
    )
}

/// Charts without an SVG rendering are shown as a table.
fn render_grid_table(title: &str, data: &ChartData) -> String {
    let rows: String = match data {
        ChartData::Grid(cells) => cells
            .iter()
            .map(|c| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&c.location),
                    c.period,
                    c.value
                )
            })
            .collect(),
        _ => String::new(),
    };
    format!(
        r#"<h4>{title}</h4><div class="scroll"><table><thead><tr><th>Code</th><th>Year</th><th>Count</th></tr></thead><tbody>{rows}</tbody></table></div>"#,
        title = escape_html(title),
        rows = rows
    )
}

/// Percent-encode a query value.
pub fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn inline_css() -> &'static str {
    r#"
body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; background: #f4f4f4; color: #222; }
.navbar { background: #1a1a1a; color: #fff; padding: 14px 30px; }
.navbar .brand { color: #fff; font-size: 20px; text-decoration: none; font-weight: 600; }
main { padding: 20px 30px; }
.index li { margin: 8px 0; font-size: 18px; }
.control { margin-bottom: 16px; }
.control label { display: block; font-weight: 600; margin-bottom: 6px; }
.control select { min-width: 240px; padding: 6px; }
section { margin-bottom: 24px; border-top: 1px solid #ddd; padding-top: 8px; }
.row { display: flex; flex-wrap: wrap; gap: 16px; }
.card { background: #fff; border: 1px solid #ddd; border-radius: 4px; min-width: 200px; }
.card-header { padding: 8px 12px; border-bottom: 1px solid #ddd; background: #fafafa; }
.card-body { padding: 12px; font-size: 24px; font-weight: 600; }
.chart { background: #fff; border: 1px solid #ddd; border-radius: 4px; padding: 8px; }
.chart img { display: block; max-width: 100%; }
.tabs { flex: 1 1 640px; }
.tab-bar { display: flex; gap: 4px; margin-bottom: 8px; }
.tab { border: 1px solid #ccc; background: #fff; padding: 6px 12px; cursor: pointer; }
.tab.active { background: #1a1a1a; color: #fff; }
.pane { display: none; }
.pane.active { display: block; }
.scroll { max-height: 420px; overflow-y: auto; }
table { border-collapse: collapse; }
td, th { padding: 4px 10px; border-bottom: 1px solid #eee; text-align: left; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
(function () {
    const dashboard = document.body.dataset.dashboard;
    const select = document.getElementById('country');

    document.querySelectorAll('.tab').forEach(function (button) {
        button.addEventListener('click', function () {
            const bar = button.closest('.tabs');
            bar.querySelectorAll('.tab, .pane').forEach(function (el) { el.classList.remove('active'); });
            button.classList.add('active');
            bar.querySelector('[data-pane="' + button.dataset.tab + '"]').classList.add('active');
        });
    });

    function refresh(country) {
        const query = '?country=' + encodeURIComponent(country);
        document.querySelectorAll('[data-reactive="true"]').forEach(function (region) {
            const key = region.dataset.key;
            if (region.dataset.svg === 'true') {
                region.querySelector('img').src = '/api/' + dashboard + '/svg/' + key + query;
                return;
            }
            fetch('/api/' + dashboard + '/panels/' + key + query)
                .then(function (resp) { return resp.json(); })
                .then(function (panel) {
                    const target = region.querySelector('[data-value]');
                    if (target && panel.panel === 'card') { target.textContent = panel.display; }
                });
        });
    }

    if (select) {
        select.addEventListener('change', function () { refresh(select.value); });
    }
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Dashboard, DashboardSettings, LayoffsDashboard};
    use polars::prelude::*;

    fn layout() -> Layout {
        let df = df!(
            "company" => &["Acme"],
            "location" => &["Pune"],
            "industry" => &["Retail"],
            "total_laid_off" => &[10i64],
            "date" => &["2022-11-03"],
            "stage" => &["IPO"],
            "country" => &["Côte d'Ivoire"],
            "funds_raised" => &[5.0f64]
        )
        .unwrap();
        LayoffsDashboard::from_frame(df, DashboardSettings::default())
            .unwrap()
            .layout()
            .clone()
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn encodes_query_values() {
        assert_eq!(encode_query("All countries"), "All%20countries");
        assert_eq!(encode_query("Côte"), "C%C3%B4te");
    }

    #[test]
    fn dashboard_page_has_every_region() {
        let layout = layout();
        let html = render_dashboard(&layout);
        assert!(html.contains("<title>Tech Layoffs 2020-2022</title>"));
        for region in &layout.regions {
            assert!(html.contains(&format!("id=\"panel-{}\"", region.panel.key)));
        }
        assert!(html.contains("Côte d&#39;Ivoire"), "options are escaped");
        assert!(html.contains("/api/layoffs/svg/bar_city?country=All%20countries"));
        assert!(html.contains("data-tab=\"bar_industry\""));
    }

    #[test]
    fn index_links_dashboards() {
        let html = render_index(&[("layoffs", "Tech Layoffs 2020-2022")]);
        assert!(html.contains("href=\"/layoffs\""));
    }
}
