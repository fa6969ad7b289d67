use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap};

use crate::compare::ComparisonSet;
use crate::map::{center_points, locality_markers, municipality_layer, Bounds};
use crate::model::{Indicator, Rate, ScoredMunicipality};
use crate::output::{format_rate, truncate};
use crate::tui::app::{App, InputMode, Tab};
use crate::tui::theme::{to_color, ThemeColors};

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 8 || area.width < 40 {
        let msg = Paragraph::new("Terminal too small")
            .alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Tabs(1) + Body(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),  // Title bar
        Constraint::Length(1),  // Tab bar
        Constraint::Fill(1),    // Tab body
        Constraint::Length(1),  // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);

    // Tab bodies borrow rows out of the dataset while rendering the table.
    let mut table_state = std::mem::take(&mut app.table_state);
    match app.tab {
        Tab::Home => render_home(frame, chunks[2], app, &mut table_state),
        Tab::Comparator => render_comparator(frame, chunks[2], app, &mut table_state),
        Tab::Map => render_map(frame, chunks[2], app, &mut table_state),
        Tab::Centers => render_centers(frame, chunks[2], app, &mut table_state),
        Tab::Search => render_search(frame, chunks[2], app, &mut table_state),
    }
    app.table_state = table_state;
    render_status_bar(frame, chunks[3], app);

    if app.input_mode == InputMode::Help {
        render_help_popup(frame, &app.theme);
    }

    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let left = "Muni Compass";
    let mut spans = vec![Span::styled(left, Style::default().fg(app.theme.title_color).bold())];

    let loaded = format!("data loaded {}", app.dataset.loaded_at.format("%H:%M:%S"));
    let padding_len = (area.width as usize).saturating_sub(left.len() + loaded.len());
    spans.push(Span::raw(" ".repeat(padding_len)));
    spans.push(Span::styled(loaded, Style::default().fg(app.theme.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("{} {}", i + 1, tab.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(app.theme.tab_inactive_style)
        .highlight_style(app.theme.tab_active_style.reversed())
        .divider(" | ");

    frame.render_widget(tabs, area);
}

fn index_bar(index: Rate, width: usize, theme: &ThemeColors) -> Line<'static> {
    let Some(value) = index.value() else {
        return Line::from(Span::styled(format!("{:>5} ", "n/a"), Style::default().fg(theme.muted)));
    };
    let filled = (value.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    let color = theme.score_color(value);

    let mut spans = vec![Span::styled(format!("{:>5.3} ", value), Style::default().fg(color))];
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(color)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(theme.bar_empty)));
    }
    Line::from(spans)
}

/// Ranked municipality table shared by the Home and Search tabs.
fn municipality_table<'a>(
    rows: &[&'a ScoredMunicipality],
    theme: &ThemeColors,
    low_population: u64,
) -> Table<'a> {
    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            let row_style = if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };
            let name = if m.record.population_total < low_population {
                Line::from(vec![
                    Span::raw(m.name().to_string()),
                    Span::styled(" !", Style::default().fg(theme.warning)),
                ])
            } else {
                Line::from(m.name().to_string())
            };

            Row::new(vec![
                Cell::from(format!("{}.", idx + 1)).style(Style::default().fg(theme.index_color)),
                Cell::from(index_bar(m.opportunity_index, 8, theme)),
                Cell::from(name),
                Cell::from(format!("{:>8.2}", m.rates.schools_per_1000)),
                Cell::from(format!("{:>8.2}", m.rates.housing_per_1000)),
                Cell::from(format!("{:>9.2}", m.rates.companies_per_1000)),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),   // Index: "999."
        Constraint::Length(15),  // Index + bar: "0.734 ██████░░"
        Constraint::Fill(1),     // Name
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    Table::new(table_rows, widths)
        .header(
            Row::new(vec!["#", "Opportunity", "Municipality", "Schools", "Housing", "Companies"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected)
}

fn render_home(frame: &mut Frame, area: Rect, app: &App, state: &mut TableState) {
    let chunks = Layout::horizontal([Constraint::Length(36), Constraint::Fill(1)]).split(area);

    let dataset = &app.dataset;
    let table = &dataset.municipalities;
    let weights = table.weights();
    let maxima = table.maxima();
    let theme = &app.theme;
    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.muted));

    let mut lines = vec![
        Line::from(Span::styled("Dataset", theme.header_style)),
        Line::from(vec![label("Municipalities  "), Span::raw(table.len().to_string())]),
        Line::from(vec![label("Centers         "), Span::raw(dataset.centers.len().to_string())]),
        Line::from(vec![label("Skipped rows    "), Span::raw(dataset.skipped_rows.to_string())]),
        Line::from(""),
        Line::from(Span::styled("Weights", theme.header_style)),
    ];
    for indicator in Indicator::ALL {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", indicator.label()), Style::default().fg(theme.muted)),
            Span::raw(format!("{:.2}", weights.get(indicator))),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Reference maxima (per 1000)", theme.header_style)));
    for indicator in Indicator::ALL {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<16}", indicator.count_label()),
                Style::default().fg(theme.muted),
            ),
            Span::raw(format!("{:.2}", maxima.get(indicator))),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("! population under {}", app.config.comparison.low_population_threshold),
        Style::default().fg(theme.warning),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" Overview ")),
        chunks[0],
    );

    let rows = app.ranked();
    let low_population = app.config.comparison.low_population_threshold;
    let widget = municipality_table(&rows, &app.theme, low_population)
        .block(Block::bordered().title(" Ranking "));
    frame.render_stateful_widget(widget, chunks[1], state);
}

fn render_comparator(frame: &mut Frame, area: Rect, app: &App, state: &mut TableState) {
    let chunks = Layout::horizontal([Constraint::Length(40), Constraint::Fill(1)]).split(area);
    let theme = &app.theme;

    let rows = app.comparator_rows();
    let list_rows: Vec<Row> = rows
        .iter()
        .map(|m| {
            let picked = app.compared.iter().any(|n| n == m.name());
            let marker = if picked { "[x]" } else { "[ ]" };
            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(theme.compared_marker)),
                Cell::from(truncate(m.name(), 24)),
                Cell::from(format!("{:>8}", m.record.population_total))
                    .style(Style::default().fg(theme.muted)),
            ])
        })
        .collect();

    let title = if app.input_mode == InputMode::Filter || !app.filter.is_empty() {
        format!(" Filter: {}| ", app.filter)
    } else {
        " Municipalities ".to_string()
    };
    let list = Table::new(
        list_rows,
        [Constraint::Length(3), Constraint::Fill(1), Constraint::Length(8)],
    )
    .block(Block::bordered().title(title))
    .row_highlight_style(theme.row_selected);

    let panel = comparison_lines(app);
    let panel_title = format!(" Comparison ({}) ", app.value_view.label());
    let panel = Paragraph::new(panel)
        .wrap(Wrap { trim: false })
        .block(Block::bordered().title(panel_title));

    frame.render_widget(panel, chunks[1]);
    frame.render_stateful_widget(list, chunks[0], state);
}

fn comparison_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let selection = match app.comparison() {
        Ok(ComparisonSet::Selected(selection)) => selection,
        Ok(ComparisonSet::Empty) => {
            return vec![Line::from(Span::styled(
                "Select up to 3 municipalities with Space.",
                Style::default().fg(theme.muted),
            ))];
        }
        Err(e) => {
            let style = Style::default().fg(theme.flash_error);
            return vec![Line::from(Span::styled(e.to_string(), style))];
        }
    };

    let mut lines = Vec::new();
    for row in &selection.rows {
        let m = row.municipality;
        let mut header = vec![Span::styled(m.name().to_string(), Style::default().bold())];
        if row.low_reliability {
            header.push(Span::styled(
                "  small population, values may be unreliable",
                Style::default().fg(theme.warning),
            ));
        }
        lines.push(Line::from(header));
        lines.push(Line::from(format!("  Population        {}", m.record.population_total)));
        for indicator in Indicator::ALL {
            lines.push(Line::from(format!(
                "  {:<17} {:>8}  ({} total)",
                indicator.label(),
                format_rate(row.value(indicator, app.value_view)),
                m.raw_count(indicator)
            )));
        }
        let mut index_line = vec![Span::raw("  Opportunity       ")];
        index_line.extend(index_bar(m.opportunity_index, 10, theme).spans);
        lines.push(Line::from(index_line));
        lines.push(Line::from(""));
    }

    let summary = selection.summary();
    let leader = |name: Option<&str>| name.unwrap_or("n/a").to_string();
    lines.push(Line::from(Span::styled("Summary", theme.header_style)));
    lines.push(Line::from(format!("  Best opportunity  {}", leader(summary.best_opportunity))));
    lines.push(Line::from(format!("  Most schools      {}", leader(summary.most_schools))));
    lines.push(Line::from(format!("  Most housing      {}", leader(summary.most_housing))));
    lines.push(Line::from(format!("  Most companies    {}", leader(summary.most_companies))));
    lines
}

/// Canvas over the given bounds with a small margin.
fn point_canvas<'a>(
    title: String,
    bounds: Option<Bounds>,
    points: Vec<((f64, f64), Color)>,
    theme: &ThemeColors,
) -> Canvas<'a, impl Fn(&mut ratatui::widgets::canvas::Context)> {
    let (x, y) = match bounds {
        Some(b) => {
            let pad_lon = ((b.max_lon - b.min_lon) * 0.05).max(0.01);
            let pad_lat = ((b.max_lat - b.min_lat) * 0.05).max(0.01);
            (
                [b.min_lon - pad_lon, b.max_lon + pad_lon],
                [b.min_lat - pad_lat, b.max_lat + pad_lat],
            )
        }
        None => ([-1.0, 1.0], [-1.0, 1.0]),
    };

    Canvas::default()
        .block(Block::bordered().title(title))
        .background_color(theme.canvas_bg)
        .marker(Marker::Braille)
        .x_bounds(x)
        .y_bounds(y)
        .paint(move |ctx| {
            for (coords, color) in &points {
                ctx.draw(&Points {
                    coords: std::slice::from_ref(coords),
                    color: *color,
                });
            }
        })
}

fn render_map(frame: &mut Frame, area: Rect, app: &App, state: &mut TableState) {
    let chunks = Layout::horizontal([Constraint::Fill(1), Constraint::Length(38)]).split(area);
    let layer = municipality_layer(&app.dataset.municipalities, app.metric);

    let legend = match (layer.min, layer.max) {
        (Some(min), Some(max)) => format!(" {}: {:.2} - {:.2} ", layer.metric.label(), min, max),
        _ => format!(" {}: no data ", layer.metric.label()),
    };
    let points = layer
        .points
        .iter()
        // Canvas x is longitude, y is latitude.
        .map(|p| ((p.longitude, p.latitude), to_color(p.color)))
        .collect();
    frame.render_widget(point_canvas(legend, layer.bounds, points, &app.theme), chunks[0]);

    let rows: Vec<Row> = layer
        .points
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from("██").style(Style::default().fg(to_color(p.color))),
                Cell::from(truncate(&p.name, 22)),
                Cell::from(format!("{:>9.2}", p.value)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(2), Constraint::Fill(1), Constraint::Length(9)],
    )
    .block(Block::bordered().title(" Points "))
    .row_highlight_style(app.theme.row_selected);
    frame.render_stateful_widget(table, chunks[1], state);
}

fn render_centers(frame: &mut Frame, area: Rect, app: &App, state: &mut TableState) {
    let chunks = Layout::horizontal([Constraint::Fill(1), Constraint::Length(44)]).split(area);

    let Some(regime) = app.current_regime() else {
        frame.render_widget(
            Paragraph::new("No educational centers loaded")
                .alignment(Alignment::Center)
                .block(Block::bordered()),
            area,
        );
        return;
    };

    let centers = &app.dataset.centers;
    let (title, points, rows): (String, Vec<((f64, f64), Color)>, Vec<Row>) = if app.center_detail {
        let detail = center_points(centers, &regime);
        let points = detail
            .iter()
            .map(|p| ((p.longitude, p.latitude), to_color(p.color)))
            .collect();
        let rows = detail
            .iter()
            .map(|p| {
                Row::new(vec![
                    Cell::from("██").style(Style::default().fg(to_color(p.color))),
                    Cell::from(truncate(p.name, 28)),
                    Cell::from(p.kind.unwrap_or("-").to_string()),
                ])
            })
            .collect();
        (format!(" {} centers: {} ", regime.label(), detail.len()), points, rows)
    } else {
        let markers = locality_markers(centers, &regime, &app.config.legend);
        let points = markers
            .iter()
            .map(|m| ((m.longitude, m.latitude), to_color(m.color)))
            .collect();
        let rows = markers
            .iter()
            .map(|m| {
                Row::new(vec![
                    Cell::from("██").style(Style::default().fg(to_color(m.color))),
                    Cell::from(truncate(&m.locality, 28)),
                    Cell::from(format!("{:>4}", m.center_count)),
                ])
            })
            .collect();
        (format!(" {} by locality: {} ", regime.label(), markers.len()), points, rows)
    };

    let bounds = Bounds::from_points(points.iter().map(|(coords, _)| (coords.1, coords.0)));
    frame.render_widget(point_canvas(title, bounds, points, &app.theme), chunks[0]);

    let table = Table::new(
        rows,
        [Constraint::Length(2), Constraint::Fill(1), Constraint::Length(6)],
    )
    .block(Block::bordered().title(if app.center_detail { " Centers " } else { " Localities " }))
    .row_highlight_style(app.theme.row_selected);
    frame.render_stateful_widget(table, chunks[1], state);
}

fn render_search(frame: &mut Frame, area: Rect, app: &App, state: &mut TableState) {
    let chunks = Layout::vertical([Constraint::Length(5), Constraint::Fill(1)]).split(area);
    let theme = &app.theme;

    let lines: Vec<Line> = Indicator::ALL
        .iter()
        .enumerate()
        .map(|(i, indicator)| {
            let focused = *indicator == app.threshold_focus;
            let value = match app.thresholds.get(*indicator) {
                Some(v) => format!(">= {:.2}", v),
                None => "any".to_string(),
            };
            let style = if focused {
                Style::default().fg(theme.title_color).bold()
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{} ", i + 1), Style::default().fg(theme.status_key_color)),
                Span::styled(format!("{:<26}", indicator.metric().label()), style),
                Span::styled(value, style),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" Minimum values ")),
        chunks[0],
    );

    match app.search_results() {
        Ok(rows) => {
            let title = format!(" {} matching ", rows.len());
            let low_population = app.config.comparison.low_population_threshold;
            let widget = municipality_table(&rows, &app.theme, low_population)
                .block(Block::bordered().title(title));
            frame.render_stateful_widget(widget, chunks[1], state);
        }
        Err(e) => {
            frame.render_widget(
                Paragraph::new(e.to_string())
                    .style(Style::default().fg(theme.flash_error))
                    .block(Block::bordered()),
                chunks[1],
            );
        }
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Failed") || msg.starts_with("Error") {
            theme.flash_error
        } else if ["Reloaded", "Added:", "Removed:"].iter().any(|p| msg.starts_with(p)) {
            theme.flash_success
        } else {
            theme.muted
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else if app.input_mode == InputMode::Filter {
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(theme.status_key_color)),
            Span::raw(":keep filter "),
            Span::styled("Esc", Style::default().fg(theme.status_key_color)),
            Span::raw(":clear filter"),
        ])
    } else {
        let elapsed = app.last_refresh.elapsed();
        let refresh_time = if elapsed.as_secs() < 60 {
            format!("checked {}s ago", elapsed.as_secs())
        } else {
            format!("checked {}m ago", elapsed.as_secs() / 60)
        };

        let tab_hints: &[(&str, &str)] = match app.tab {
            Tab::Home => &[],
            Tab::Comparator => &[
                ("Space", ":pick "),
                ("/", ":filter "),
                ("v", ":view "),
                ("c", ":clear "),
            ],
            Tab::Map => &[("m", ":metric ")],
            Tab::Centers => &[("g", ":regime "), ("d", ":detail ")],
            Tab::Search => &[("1-3", ":focus "), ("+/-", ":adjust "), ("x", ":any ")],
        };
        let common: &[(&str, &str)] =
            &[("Tab", ":next "), ("r", ":reload "), ("?", ":help "), ("q", ":quit")];

        let mut spans = vec![
            Span::styled(refresh_time, Style::default().fg(theme.muted)),
            Span::raw("  "),
        ];
        for (key, label) in tab_hints.iter().chain(common.iter()) {
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    // Clamp dimensions to area bounds
    let width = width.min(area.width);
    let height = height.min(area.height);

    // Calculate centered position
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Render the help overlay popup
fn render_help_popup(frame: &mut Frame, theme: &ThemeColors) {
    let popup_area = centered_rect_fixed(52, 22, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Keyboard Shortcuts ", theme.popup_title))
        .border_style(Style::default().fg(theme.popup_border))
        .style(Style::default().bg(theme.popup_bg));
    frame.render_widget(block.clone(), popup_area);

    let inner = block.inner(popup_area);

    let key_style = Style::default().fg(theme.status_key_color).bold();
    let key = |k: &'static str| Span::styled(format!("{:<14}", k), key_style);
    let help_lines = vec![
        Line::from(vec![key("Tab / S-Tab"), Span::raw("Next / previous tab")]),
        Line::from(vec![key("F1-F5"), Span::raw("Jump to tab")]),
        Line::from(vec![key("j / Down"), Span::raw("Move down")]),
        Line::from(vec![key("k / Up"), Span::raw("Move up")]),
        Line::from(""),
        Line::from(vec![key("Space"), Span::raw("Add/remove from comparison")]),
        Line::from(vec![key("/"), Span::raw("Filter municipalities")]),
        Line::from(vec![key("v"), Span::raw("Per-1000 / normalized values")]),
        Line::from(vec![key("c"), Span::raw("Clear comparison")]),
        Line::from(vec![key("m"), Span::raw("Next map metric")]),
        Line::from(vec![key("g"), Span::raw("Next center regime")]),
        Line::from(vec![key("d"), Span::raw("Localities / individual centers")]),
        Line::from(vec![key("1 / 2 / 3"), Span::raw("Focus a search threshold")]),
        Line::from(vec![key("+ / -"), Span::raw("Raise / lower threshold")]),
        Line::from(vec![key("x"), Span::raw("Remove threshold")]),
        Line::from(""),
        Line::from(vec![key("r"), Span::raw("Reload data files")]),
        Line::from(vec![key("?"), Span::raw("Show/hide this help")]),
        Line::from(vec![key("q / Ctrl-c"), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(theme.muted))),
    ];

    frame.render_widget(Paragraph::new(help_lines), inner);
}

/// Render the loading spinner overlay
fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered();
    frame.render_widget(block.clone(), popup_area);

    let inner = block.inner(popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % 10];

    let loading_text = Paragraph::new(format!("{} Reloading data...", spinner))
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));

    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(50, 4, area);
        assert_eq!(rect, Rect::new(0, 3, 20, 4));
    }

    #[test]
    fn test_index_bar_undefined() {
        let line = index_bar(Rate::Undefined, 8, &ThemeColors::dark());
        assert_eq!(line.spans.len(), 1);
        assert!(line.spans[0].content.contains("n/a"));
    }

    #[test]
    fn test_index_bar_fill() {
        let line = index_bar(Rate::Defined(0.5), 8, &ThemeColors::dark());
        assert_eq!(line.spans[1].content, "████");
        assert_eq!(line.spans[2].content, "░░░░");
    }
}
