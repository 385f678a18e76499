use ratatui::style::{Color, Modifier, Style};

const SADDLE_BROWN: Color = Color::Rgb(139, 69, 19);
const TAN: Color = Color::Rgb(210, 180, 140);

pub struct MandirStyles {
    pub title: Style,
    pub tab: Style,
    pub tab_active: Style,
    pub text: Style,
    pub dim: Style,
    pub highlight: Style,
    pub playing: Style,
    pub gauge: Style,
    pub error: Style,
}

impl Default for MandirStyles {
    fn default() -> Self {
        Self {
            title: Style::default().fg(SADDLE_BROWN).add_modifier(Modifier::BOLD),
            tab: Style::default().fg(SADDLE_BROWN),
            tab_active: Style::default()
                .fg(Color::White)
                .bg(TAN)
                .add_modifier(Modifier::BOLD),
            text: Style::default(),
            dim: Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            highlight: Style::default().fg(Color::Black).bg(TAN),
            playing: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            gauge: Style::default().fg(SADDLE_BROWN),
            error: Style::default().fg(Color::Red),
        }
    }
}
