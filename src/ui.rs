use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::app::{App, InputMode};
use crate::gateway::CatalogSource;
use crate::model::{CommandKind, OsVariant};
use crate::resolver::ResolvedCommands;

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);

const EMPTY_LIST_TEXT: &str = "No matching labs found.";

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.mode() == InputMode::Detail {
        render_detail_modal(frame, app);
    }

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let left_line = build_left_header_line(app);
    if area.width < 42 {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let right_line = build_right_header_line(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn build_left_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " LABDECK ", Color::Black, ACCENT, PL_A);
    push_powerline_segment(
        &mut spans,
        format!(" 󰒋 {} ", compact_text(&display_source(app.catalog_source()), 28)),
        Color::White,
        PL_A,
        PL_B,
    );
    push_powerline_segment(
        &mut spans,
        format!(
            " 󰈲 {} ",
            compact_text(
                if app.filter().is_empty() {
                    "-"
                } else {
                    app.filter()
                },
                16,
            )
        ),
        Color::White,
        PL_B,
        PL_C,
    );
    push_powerline_segment(
        &mut spans,
        format!(
            " 󰀶 {}/{} ",
            app.visible_images().len(),
            app.catalog().len()
        ),
        Color::White,
        PL_C,
        BG,
    );

    Line::from(spans)
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    let (bridge_text, bridge_fg, bridge_bg) = match app.bridge_label() {
        Some(label) => (format!(" 󰆍 {} ", compact_text(label, 18)), Color::Black, ACCENT),
        None => (" 󰆍 copy-only ".to_string(), Color::Black, WARN),
    };
    let refresh_text = if app.loading() {
        " 󰑓 loading… ".to_string()
    } else {
        format!(
            " 󰑓 {} ",
            app.last_refresh().unwrap_or_else(|| "never".to_string())
        )
    };

    push_powerline_segment_rtl(&mut spans, refresh_text, Color::White, PL_D, BG);
    push_powerline_segment_rtl(&mut spans, bridge_text, bridge_fg, bridge_bg, PL_D);
    spans.push(Span::styled(" ", Style::default().bg(bridge_bg)));
    Line::from(spans)
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    app.set_page_size(table_rows_visible(area));
    let focused = app.mode() != InputMode::Detail;
    render_table(frame, area, app, focused);
}

fn render_table(frame: &mut Frame, area: Rect, app: &App, focused: bool) {
    let visible = app.visible_images();
    let block = Block::default()
        .title(format!("Lab Images ({})", visible.len()))
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));

    if visible.is_empty() {
        let (message, color) = match app.catalog().last_error() {
            Some(error) if app.catalog().is_empty() => (error.to_string(), ERROR),
            _ if app.loading() && app.catalog().is_empty() => {
                ("Loading lab catalog…".to_string(), MUTED)
            }
            _ => (EMPTY_LIST_TEXT.to_string(), MUTED),
        };
        let panel = Paragraph::new(Text::from(message))
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center)
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(panel, area);
        return;
    }

    let header_row = Row::new(["Semester", "Subject", "Variant"].into_iter().map(|header| {
        Cell::from(header).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let rows = visible.iter().map(|image| {
        let variant = app.variant_for(&image.id);
        Row::new([
            Cell::from(image.semester().to_string()).style(Style::default().fg(MUTED)),
            Cell::from(image.subject().to_string()).style(Style::default().fg(Color::White)),
            Cell::from(variant_badge(variant)).style(Style::default().fg(variant_color(variant))),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(22),
            Constraint::Percentage(62),
            Constraint::Percentage(16),
        ],
    )
    .header(header_row)
    .block(block)
    .column_spacing(1)
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(24, 36, 58))
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    state.select(app.selected_index());
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_detail_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(82, 80, frame.area());
    frame.render_widget(Clear, area);

    let (title, lines) = match (app.open_image(), app.open_resolved()) {
        (Some(image), Some(resolved)) => (image.title(), detail_lines(app, &resolved)),
        _ => (
            "Lab image".to_string(),
            vec![
                Line::from(Span::styled(
                    "This lab image is no longer in the catalog.",
                    Style::default().fg(WARN),
                )),
                Line::from(""),
                Line::from(Span::styled("Esc close", Style::default().fg(MUTED))),
            ],
        ),
    };

    let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll().min(max_scroll), 0))
        .block(
            Block::default()
                .title(format!(" {} ", compact_text(&title, 60)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn detail_lines(app: &App, resolved: &ResolvedCommands) -> Vec<Line<'static>> {
    let mut lines = vec![variant_tabs_line(resolved.variant), Line::from("")];

    for kind in [CommandKind::Pull, CommandKind::Run] {
        let focused = app.detail_focus() == kind;
        let marker = if focused { "󰜴 " } else { "  " };
        let heading_style = if focused {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED).add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), heading_style),
            Span::styled(kind.title().to_string(), heading_style),
        ]));
        match resolved.get(kind) {
            Some(command) => {
                let command_style = if focused {
                    Style::default().fg(Color::Black).bg(Color::Rgb(94, 234, 212))
                } else {
                    Style::default().fg(Color::White).bg(BG)
                };
                for command_line in command.lines() {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(format!(" {command_line} "), command_style),
                    ]));
                }
            }
            None => lines.push(Line::from(Span::styled(
                format!("  {} command missing", resolved.variant.title()),
                Style::default().fg(WARN),
            ))),
        }
        lines.push(Line::from(""));
    }

    if let Some(instructions) = &resolved.instructions {
        lines.push(Line::from(Span::styled(
            format!("{} Instructions", resolved.variant.title()),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        for line in instructions.lines() {
            lines.push(Line::from(format!("  {line}")));
        }
        lines.push(Line::from(""));
    }

    if let Some(notes) = &resolved.notes {
        lines.push(Line::from(Span::styled(
            "Notes",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        for line in notes.lines() {
            lines.push(Line::from(format!("  {line}")));
        }
        lines.push(Line::from(""));
    }

    let run_hint = if app.bridge_label().is_some() {
        "Enter/x run"
    } else {
        "Enter/x run (unavailable)"
    };
    lines.push(Line::from(Span::styled(
        format!("u/w or Tab variant  j/k pull/run  y copy  {run_hint}  PgUp/PgDn scroll  Esc close"),
        Style::default().fg(MUTED),
    )));
    lines
}

fn variant_tabs_line(active: OsVariant) -> Line<'static> {
    let mut spans = Vec::new();
    for variant in OsVariant::ALL {
        let style = if variant == active {
            Style::default()
                .fg(Color::Black)
                .bg(variant_color(variant))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED).bg(BG)
        };
        spans.push(Span::styled(
            format!(" {} {} ", variant_icon(variant), variant.title()),
            style,
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    if app.mode() == InputMode::Filter {
        let mut spans = Vec::new();
        push_powerline_segment(&mut spans, " 󰈲 flt ", Color::Black, WARN, PL_B);
        push_powerline_segment(
            &mut spans,
            format!(" /{} ", app.filter()),
            Color::White,
            PL_B,
            BG,
        );
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let status_text = app.status().to_string();
    let status_icon = footer_status_icon(&status_text);
    let (mode_label, mode_bg) = match app.mode() {
        InputMode::Detail => (" 󰋼 lab ", PL_C),
        _ => (" 󰘳 nrm ", PL_A),
    };

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, mode_label, Color::White, mode_bg, PL_B);
    let status_width_hint = area.width.saturating_sub(24).min(120) as usize;
    push_powerline_segment(
        &mut spans,
        format!(
            " {status_icon} {} ",
            compact_text(&status_text, status_width_hint.max(24))
        ),
        Color::White,
        PL_B,
        BG,
    );

    let right_spans = build_footer_hint_spans(app);
    let min_left = 28u16;
    let max_right = area.width.saturating_sub(min_left);
    let right_width = (spans_width(&right_spans) as u16).min(max_right);
    if right_width == 0 {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(BG))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn build_footer_hint_spans(app: &App) -> Vec<Span<'static>> {
    let hints = match app.mode() {
        InputMode::Detail => [" y copy ", " ⏎ run ", " esc back "],
        _ => [" / filter ", " ⏎ open ", " ? help "],
    };
    let colors = [
        Color::Rgb(45, 212, 191),
        Color::Rgb(99, 102, 241),
        Color::Rgb(124, 58, 237),
    ];

    let mut spans = Vec::new();
    let mut next_bg = BG;
    for (content, bg) in hints.into_iter().zip(colors) {
        push_powerline_segment_rtl(&mut spans, content, Color::Black, bg, next_bg);
        next_bg = bg;
    }
    spans
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = [
        "failed",
        "error",
        "missing",
        "unavailable",
        "refused",
        "timed out",
    ]
    .iter()
    .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn push_powerline_segment_rtl(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 64, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "labdeck help  mode:{}  source:{}",
            help_mode_label(app.mode()),
            compact_text(&display_source(app.catalog_source()), 40)
        )),
        Line::from(""),
    ];
    for line in contextual_help_lines(app) {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn contextual_help_lines(app: &App) -> Vec<&'static str> {
    let mut lines = vec![
        "List: j/k or arrows move  gg/G top/bottom  PgUp/PgDn page",
        "Filter: / edit subject filter (applies while typing)  Enter keep  Esc restore",
        "Catalog: r or F5 reload  Esc clear filter  q quit",
        "",
    ];

    if app.mode() == InputMode::Detail {
        lines.push("Lab details active");
        lines.push("Variant: u Ubuntu  w Windows  Tab/h/l toggle (remembered per lab)");
        lines.push("Commands: j/k focus pull/run  y/c copy  Enter/x run  Esc close");
        lines.push("Scroll: PgUp/PgDn or Ctrl+u/d move through long instructions and notes");
    } else {
        lines.push("Enter opens the selected lab with its pull/run commands.");
    }

    if app.bridge_label().is_none() {
        lines.push("");
        lines.push("No execution bridge on this host: commands can be copied but not run.");
    }
    lines
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Filter => "filter",
        InputMode::Detail => "detail",
    }
}

fn variant_badge(variant: OsVariant) -> String {
    format!("{} {}", variant_icon(variant), variant.title())
}

fn variant_icon(variant: OsVariant) -> &'static str {
    match variant {
        OsVariant::Ubuntu => "",
        OsVariant::Windows => "",
    }
}

fn variant_color(variant: OsVariant) -> Color {
    match variant {
        OsVariant::Ubuntu => Color::Rgb(251, 146, 60),
        OsVariant::Windows => Color::Rgb(96, 165, 250),
    }
}

fn display_source(source: &str) -> String {
    let trimmed = source.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

/// Header label for a catalog source.
pub fn source_label(source: &CatalogSource) -> String {
    match source {
        CatalogSource::Remote(url) => url.clone(),
        CatalogSource::File(path) => format!("file:{}", path.display()),
    }
}

fn table_rows_visible(area: Rect) -> usize {
    area.height.saturating_sub(3).max(1) as usize
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
