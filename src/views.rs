use crate::models::question::{AnswerLetter, Question};
use crate::store::{QuizState, UploadPhase};
use maud::{html, Markup, PreEscaped, DOCTYPE};

const MATHJAX_CONFIG: &str = r#"window.MathJax = {
  tex: { inlineMath: [['$', '$'], ['\\(', '\\)']], displayMath: [['$$', '$$'], ['\\[', '\\]']] },
  svg: { fontCache: 'global' }
};"#;

// Client glue. Every state change goes through /api/questions/dispatch; the
// reply carries the next state, the status line, the list markup and, when
// the list changed, how long to wait before typesetting math.
const CLIENT_JS: &str = r#"
let state = JSON.parse(document.getElementById('initial-state').textContent) || { phase: 'idle', questions: [], loading: false, error: null };
let dragFrom = null;
const list = () => document.getElementById('questions');
const setStatus = (msg) => { document.getElementById('status').textContent = msg || ''; };
const typeset = (delay) => {
  if (delay == null) return;
  setTimeout(() => { if (window.MathJax && MathJax.typesetPromise) MathJax.typesetPromise().catch(() => {}); }, delay);
};
async function dispatch(action) {
  const res = await fetch('/api/questions/dispatch', { method: 'POST', headers: { 'content-type': 'application/json' }, body: JSON.stringify({ state, action }) });
  if (!res.ok) throw new Error('Could not update the page');
  const body = await res.json();
  state = body.state;
  setStatus(body.status);
  list().innerHTML = body.html;
  bindDrag();
  typeset(body.typesetDelayMs);
}
async function fail(message) {
  try {
    await dispatch({ type: 'upload_failed', payload: message });
  } catch (_) {
    state = { phase: 'failed', questions: [], loading: false, error: message };
    list().innerHTML = '';
    setStatus(message);
  }
}
function bindDrag() {
  list().querySelectorAll('[data-position]').forEach((el) => {
    el.addEventListener('dragstart', () => { dragFrom = Number(el.dataset.position); });
    el.addEventListener('dragover', (e) => e.preventDefault());
    el.addEventListener('drop', async (e) => {
      e.preventDefault();
      const to = Number(el.dataset.position);
      const from = dragFrom;
      dragFrom = null;
      if (from === null || from === to) return;
      try { await dispatch({ type: 'reorder', payload: { from, to } }); } catch (_) {}
    });
  });
}
document.getElementById('upload').addEventListener('submit', async (e) => {
  e.preventDefault();
  try {
    await dispatch({ type: 'upload_started' });
    const res = await fetch('/api/upload', { method: 'POST', body: new FormData(e.target) });
    const body = await res.json().catch(() => ({}));
    if (!res.ok) throw new Error(body.error || 'Upload failed');
    await dispatch({ type: 'upload_succeeded', payload: body.questions });
  } catch (err) {
    await fail(err.message || 'Upload failed');
  }
});
bindDrag();
"#;

pub fn page(state: &QuizState) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Math Quiz Extractor" }
                script { (PreEscaped(MATHJAX_CONFIG)) }
                script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-svg.js" {}
            }
            body {
                main {
                    h1 { "Math Quiz Extractor" }
                    form id="upload" enctype="multipart/form-data" {
                        input type="file" name="file" accept=".pdf,.docx,application/pdf,application/vnd.openxmlformats-officedocument.wordprocessingml.document" required;
                        button type="submit" { "Upload" }
                    }
                    p id="status" { (status_text(state)) }
                    div id="questions" { (question_list(&state.questions)) }
                }
                script id="initial-state" type="application/json" { (PreEscaped(state_json(state))) }
                script { (PreEscaped(CLIENT_JS)) }
            }
        }
    }
}

// `</` is escaped so question text cannot close the script element early.
fn state_json(state: &QuizState) -> String {
    serde_json::to_string(state)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

pub fn status_text(state: &QuizState) -> String {
    match state.phase {
        UploadPhase::Idle | UploadPhase::Ready => String::new(),
        UploadPhase::Loading => "Processing document...".to_string(),
        UploadPhase::Failed => state.error.clone().unwrap_or_default(),
    }
}

pub fn question_list(questions: &[Question]) -> Markup {
    html! {
        ol.questions {
            @for (position, q) in questions.iter().enumerate() {
                (question_card(position, q))
            }
        }
    }
}

pub fn question_card(position: usize, q: &Question) -> Markup {
    html! {
        li.question draggable="true" data-position=(position) data-index=(q.index) {
            p.question-text { (q.index) ". " (q.question) }
            ul.options {
                @for (i, option) in q.options.iter().enumerate() {
                    @let letter = AnswerLetter::ALL[i].as_char();
                    @if letter == q.answer.as_char() {
                        li.option.correct data-letter=(letter) { strong { "(" (letter) ") " } (option) }
                    } @else {
                        li.option data-letter=(letter) { "(" (letter) ") " (option) }
                    }
                }
            }
        }
    }
}
