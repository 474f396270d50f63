use eframe::egui::text::LayoutJob;
use eframe::egui::{Align, Color32, FontId, TextFormat};

use emission_lines::data::text::decode_entities;

const BODY_SIZE: f32 = 13.0;
const SCRIPT_SIZE: f32 = 9.0;

// ---------------------------------------------------------------------------
// Sub/superscript markup → styled runs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Normal,
    Superscript,
    Subscript,
}

fn push_run(runs: &mut Vec<(Script, String)>, script: Script, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let text = decode_entities(raw);
    match runs.last_mut() {
        Some((last, buf)) if *last == script => buf.push_str(&text),
        _ => runs.push((script, text)),
    }
}

/// Split a cell such as `2s<sup>2</sup>2p` into text runs tagged with their
/// vertical position. Other tags are dropped; entities are resolved per run.
pub fn markup_runs(s: &str) -> Vec<(Script, String)> {
    let mut runs = Vec::new();
    let mut script = Script::Normal;
    let mut rest = s;

    while let Some(open) = rest.find('<') {
        push_run(&mut runs, script, &rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('>') else {
            push_run(&mut runs, script, tail);
            return runs;
        };
        script = match tail[1..close].trim().to_ascii_lowercase().as_str() {
            "sup" => Script::Superscript,
            "sub" => Script::Subscript,
            "/sup" | "/sub" => Script::Normal,
            _ => script,
        };
        rest = &tail[close + 1..];
    }
    push_run(&mut runs, script, rest);
    runs
}

/// Lay out a markup cell with raised / lowered small text.
pub fn markup_job(s: &str, color: Color32) -> LayoutJob {
    let mut job = LayoutJob::default();
    for (script, text) in markup_runs(s) {
        let (size, valign) = match script {
            Script::Normal => (BODY_SIZE, Align::Center),
            Script::Superscript => (SCRIPT_SIZE, Align::TOP),
            Script::Subscript => (SCRIPT_SIZE, Align::BOTTOM),
        };
        job.append(
            &text,
            0.0,
            TextFormat {
                font_id: FontId::proportional(size),
                color,
                valign,
                ..Default::default()
            },
        );
    }
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_text(s: &str) -> String {
        markup_runs(s).into_iter().map(|(_, text)| text).collect()
    }

    #[test]
    fn superscripts_become_separate_runs() {
        assert_eq!(
            markup_runs("2s<sup>2</sup>2p<sup>2</sup>"),
            vec![
                (Script::Normal, "2s".to_string()),
                (Script::Superscript, "2".to_string()),
                (Script::Normal, "2p".to_string()),
                (Script::Superscript, "2".to_string()),
            ]
        );
    }

    #[test]
    fn entities_resolve_inside_runs() {
        let runs = markup_runs("<sup>3</sup>P&ndash;<sup>1</sup>D&deg;");
        assert_eq!(runs[1], (Script::Normal, "P–".to_string()));
        assert_eq!(plain_text("<sup>3</sup>P&ndash;<sup>1</sup>D&deg;"), "3P–1D°");
    }

    #[test]
    fn other_tags_are_dropped_and_plain_text_is_one_run() {
        assert_eq!(markup_runs("1s-2p"), vec![(Script::Normal, "1s-2p".to_string())]);
        assert_eq!(plain_text("J<sub>i</sub> <i>x</i>"), "Ji x");
        assert_eq!(markup_runs("3d<SUB>5/2"), vec![
            (Script::Normal, "3d".to_string()),
            (Script::Subscript, "5/2".to_string()),
        ]);
        assert_eq!(plain_text("a < b"), "a < b");
        assert!(markup_runs("").is_empty());
    }

    #[test]
    fn job_has_one_section_per_run() {
        let job = markup_job("H<sub>2</sub>O", Color32::WHITE);
        assert_eq!(job.text, "H2O");
        assert_eq!(job.sections.len(), 3);
        assert_eq!(job.sections[1].format.valign, Align::BOTTOM);
    }
}
