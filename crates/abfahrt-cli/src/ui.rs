//! Dashboard rendering

use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
};

use abfahrt::app::AppSnapshot;
use abfahrt::data::settings::Theme;
use abfahrt::providers::types::{Product, Vehicle};

use crate::{Focus, Overlay, UiState};

/// Colors for one theme
pub struct Palette {
    bg: Color,
    fg: Color,
    dim: Color,
    accent: Color,
    highlight: Color,
    error: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            bg: Color::Black,
            fg: Color::White,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            highlight: Color::Cyan,
            error: Color::Red,
        },
        Theme::Light => Palette {
            bg: Color::White,
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
            highlight: Color::Blue,
            error: Color::Red,
        },
        // Let the terminal's own colors through
        Theme::System => Palette {
            bg: Color::Reset,
            fg: Color::Reset,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            highlight: Color::Cyan,
            error: Color::Red,
        },
    }
}

/// Marker colors per product, matching the web client's vehicle palette
fn product_color(product: Product) -> Color {
    match product {
        Product::Bus => Color::Red,
        Product::Tram => Color::Green,
        Product::Subway => Color::Blue,
        Product::Suburban => Color::Yellow,
        Product::Regional => Color::Gray,
        Product::Express => Color::Magenta,
        Product::Ferry => Color::Cyan,
        Product::Other => Color::DarkGray,
    }
}

pub fn draw(f: &mut Frame, snapshot: &AppSnapshot, ui: &UiState) {
    let p = palette(snapshot.theme);
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Abfahrt v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(p.bg).fg(p.fg));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(2),
    ])
    .split(inner);

    draw_search(f, snapshot, ui, &p, chunks[0]);

    let cols = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    match ui.overlay {
        Overlay::None => draw_results(f, snapshot, ui, &p, cols[0]),
        Overlay::Favorites => draw_favorites(f, snapshot, ui, &p, cols[0]),
        Overlay::History => draw_history(f, snapshot, ui, &p, cols[0]),
    }

    if snapshot.radar_active {
        draw_radar(f, snapshot, ui, &p, cols[1]);
    } else {
        draw_board(f, snapshot, &p, cols[1]);
    }

    draw_status(f, snapshot, &p, chunks[2]);
}

fn draw_search(f: &mut Frame, snapshot: &AppSnapshot, ui: &UiState, p: &Palette, area: Rect) {
    let border = if ui.focus == Focus::Search {
        p.accent
    } else {
        p.dim
    };
    let block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border));

    let hint = if snapshot.searching {
        Span::styled("  searching...", Style::default().fg(p.dim))
    } else if ui.input.trim().chars().count() == 1 {
        Span::styled("  (type at least 2 characters)", Style::default().fg(p.dim))
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        Span::styled(" > ", Style::default().fg(p.accent)),
        Span::styled(&ui.input, Style::default().fg(p.fg).bold()),
        Span::styled("_", Style::default().fg(p.accent)),
        hint,
    ]);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_results(f: &mut Frame, snapshot: &AppSnapshot, ui: &UiState, p: &Palette, area: Rect) {
    let block = Block::default()
        .title(format!(" Stations ({}) ", snapshot.results.len()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(p.dim));

    if snapshot.results.is_empty() {
        let hint = if snapshot.searching {
            "Searching..."
        } else {
            "Search for a station, or press F3 for favorites"
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(p.dim))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = snapshot
        .results
        .iter()
        .map(|station| {
            let pinned = snapshot.favorites.iter().any(|fav| fav.id == station.id);
            let star = if pinned { "* " } else { "  " };
            let mut spans = vec![
                Span::styled(star, Style::default().fg(Color::Yellow)),
                Span::styled(&station.name, Style::default().fg(p.fg)),
            ];
            if !station.has_location() {
                spans.push(Span::styled(
                    "  (no location)",
                    Style::default().fg(p.dim),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(p.highlight).fg(p.bg))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(ui.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_favorites(f: &mut Frame, snapshot: &AppSnapshot, ui: &UiState, p: &Palette, area: Rect) {
    let block = Block::default()
        .title(format!(" Favorites ({}) ", snapshot.favorites.len()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Yellow));

    if snapshot.favorites.is_empty() {
        f.render_widget(
            Paragraph::new("No favorites yet. Select a station and press F2 to pin it.")
                .style(Style::default().fg(p.dim))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = snapshot
        .favorites
        .iter()
        .map(|favorite| {
            let mut spans = vec![
                Span::styled("* ", Style::default().fg(Color::Yellow)),
                Span::styled(&favorite.name, Style::default().fg(p.fg)),
            ];
            if favorite.latitude.is_none() {
                spans.push(Span::styled("  (no location)", Style::default().fg(p.dim)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(p.highlight).fg(p.bg))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(ui.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_history(f: &mut Frame, snapshot: &AppSnapshot, ui: &UiState, p: &Palette, area: Rect) {
    let block = Block::default()
        .title(format!(" Recent searches ({}) ", snapshot.history.len()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(p.accent));

    if snapshot.history.is_empty() {
        f.render_widget(
            Paragraph::new("No searches yet.")
                .style(Style::default().fg(p.dim))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = snapshot
        .history
        .iter()
        .map(|term| ListItem::new(Line::from(term.as_str())))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(p.highlight).fg(p.bg))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(ui.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_board(f: &mut Frame, snapshot: &AppSnapshot, p: &Palette, area: Rect) {
    let Some(board) = &snapshot.board else {
        let hint = if snapshot.board_loading {
            "Loading departures..."
        } else {
            "Select a station and press Enter to see departures.\n\nF6 turns on the vehicle radar."
        };
        let block = Block::default()
            .title(" Departures ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(p.dim));
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(p.dim))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    };

    let age = (Utc::now() - board.fetched_at).num_seconds().max(0);
    let block = Block::default()
        .title(format!(" Departures - {} ({age}s ago) ", board.station.name))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(p.accent));

    if board.departures.is_empty() {
        f.render_widget(
            Paragraph::new("No departures scheduled for the next hour.")
                .style(Style::default().fg(p.dim))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    }

    let now = Utc::now();
    let rows: Vec<Row> = board
        .departures
        .iter()
        .map(|dep| {
            let line_style = Style::default().fg(product_color(dep.line.product)).bold();
            let delay_cell = match dep.delay_label() {
                Some(label) if dep.is_severely_delayed() => {
                    Cell::from(label).style(Style::default().fg(p.error).bold())
                }
                Some(label) => Cell::from(label).style(Style::default().fg(Color::Yellow)),
                None => Cell::from(""),
            };
            Row::new(vec![
                Cell::from(dep.line.name.clone()).style(line_style),
                Cell::from(dep.direction.clone()),
                Cell::from(dep.platform.clone().unwrap_or_default())
                    .style(Style::default().fg(p.dim)),
                Cell::from(dep.countdown_label(now)),
                delay_cell,
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Line", "Direction", "Pltf.", "Departs", "Delay"])
                .style(Style::default().fg(p.dim)),
        )
        .block(block);

    f.render_widget(table, area);
}

fn draw_radar(f: &mut Frame, snapshot: &AppSnapshot, ui: &UiState, p: &Palette, area: Rect) {
    let rows = Layout::vertical([Constraint::Min(8), Constraint::Length(9)]).split(area);

    let border = if ui.focus == Focus::Radar {
        p.accent
    } else {
        p.dim
    };
    let swept = snapshot
        .radar_swept_at
        .map(|t| format!(", swept {}s ago", (Utc::now() - t).num_seconds().max(0)))
        .unwrap_or_default();
    let block = Block::default()
        .title(format!(
            " Radar - {} vehicles{swept} (arrows pan, +/- zoom) ",
            snapshot.vehicles.len()
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border));

    let viewport = snapshot.viewport;
    let by_product = group_by_product(&snapshot.vehicles);
    let canvas = Canvas::default()
        .block(block)
        .marker(ratatui::symbols::Marker::Braille)
        .x_bounds([viewport.west, viewport.east])
        .y_bounds([viewport.south, viewport.north])
        .paint(|ctx| {
            for (product, coords) in &by_product {
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color: product_color(*product),
                });
            }
        });
    f.render_widget(canvas, rows[0]);

    // Table of the nearest few vehicles below the scatter
    let table_block = Block::default()
        .title(" Vehicles ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(p.dim));

    let vehicle_rows: Vec<Row> = snapshot
        .vehicles
        .iter()
        .take(6)
        .map(|vehicle| {
            Row::new(vec![
                Cell::from(vehicle.line.name.clone())
                    .style(Style::default().fg(product_color(vehicle.line.product)).bold()),
                Cell::from(vehicle.line.product.label()),
                Cell::from(vehicle.direction.clone().unwrap_or_default()),
                Cell::from(
                    vehicle
                        .next_stopovers
                        .first()
                        .map(|s| s.name.clone())
                        .unwrap_or_default(),
                )
                .style(Style::default().fg(p.dim)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Min(14),
        Constraint::Min(14),
    ];
    let table = Table::new(vehicle_rows, widths)
        .header(
            Row::new(vec!["Line", "Product", "Direction", "Next stop"])
                .style(Style::default().fg(p.dim)),
        )
        .block(table_block);
    f.render_widget(table, rows[1]);
}

/// Bucket vehicle positions (lon, lat) by product for colored scatter points
fn group_by_product(vehicles: &[Vehicle]) -> Vec<(Product, Vec<(f64, f64)>)> {
    let mut groups: Vec<(Product, Vec<(f64, f64)>)> = Vec::new();
    for vehicle in vehicles {
        let point = (vehicle.location.longitude, vehicle.location.latitude);
        match groups.iter_mut().find(|(p, _)| *p == vehicle.line.product) {
            Some((_, coords)) => coords.push(point),
            None => groups.push((vehicle.line.product, vec![point])),
        }
    }
    groups
}

fn draw_status(f: &mut Frame, snapshot: &AppSnapshot, p: &Palette, area: Rect) {
    let status_color = if snapshot.is_error { p.error } else { p.fg };
    let mut status_spans = vec![Span::styled(
        format!(" {}", snapshot.status_text),
        Style::default().fg(status_color),
    )];
    if snapshot.is_error {
        if let Some(detail) = &snapshot.last_error {
            status_spans.push(Span::styled(
                format!("  {detail}"),
                Style::default().fg(p.dim),
            ));
        }
    }

    let help = Line::from(vec![
        Span::styled(" F2 ", Style::default().fg(p.accent)),
        Span::styled("pin", Style::default().fg(p.dim)),
        Span::styled("  F3 ", Style::default().fg(p.accent)),
        Span::styled("favorites", Style::default().fg(p.dim)),
        Span::styled("  F4 ", Style::default().fg(p.accent)),
        Span::styled("history", Style::default().fg(p.dim)),
        Span::styled("  F5 ", Style::default().fg(p.accent)),
        Span::styled("refresh", Style::default().fg(p.dim)),
        Span::styled("  F6 ", Style::default().fg(p.accent)),
        Span::styled("radar", Style::default().fg(p.dim)),
        Span::styled("  F8 ", Style::default().fg(p.accent)),
        Span::styled("theme", Style::default().fg(p.dim)),
        Span::styled("  F10 ", Style::default().fg(p.accent)),
        Span::styled("quit", Style::default().fg(p.dim)),
    ]);

    let text = vec![Line::from(status_spans), help];
    f.render_widget(Paragraph::new(text), area);
}
