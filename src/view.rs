//! HTML rendering of the tweet refiner page.

use crate::refiner::TWEET_CHAR_LIMIT;
use crate::session::{Notice, NoticeKind, Session};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Tweet Refiner</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            margin: 0;
            padding: 20px;
            background-color: #f5f5f5;
        }
        .container {
            max-width: 760px;
            margin: 0 auto;
            background-color: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            margin-top: 0;
        }
        h2 {
            color: #555;
            font-size: 1.1em;
            margin-top: 28px;
        }
        textarea, input[type=text] {
            width: 100%;
            box-sizing: border-box;
            padding: 10px;
            font: inherit;
            border: 1px solid #ddd;
            border-radius: 4px;
        }
        textarea {
            height: 100px;
        }
        textarea[readonly] {
            background-color: #f8f9fa;
            color: #666;
        }
        .count {
            color: #777;
            font-size: 0.85em;
            font-variant-numeric: tabular-nums;
        }
        .over {
            color: #c62828;
        }
        .actions {
            display: flex;
            gap: 12px;
            margin-top: 12px;
        }
        button {
            padding: 8px 16px;
            border: 1px solid #ccc;
            border-radius: 4px;
            background-color: #f8f9fa;
            cursor: pointer;
        }
        .notice {
            padding: 12px;
            border-radius: 4px;
            margin-bottom: 20px;
        }
        .notice.success {
            background-color: #e8f5e9;
            color: #2e7d32;
        }
        .notice.error {
            background-color: #ffebee;
            color: #c62828;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>Tweet Refiner</h1>
"#;

const PAGE_TAIL: &str = r#"    </div>
    <script>
        document.querySelectorAll('textarea[data-counter]').forEach(function (box) {
            var counter = document.getElementById(box.dataset.counter);
            box.addEventListener('input', function () {
                var n = Array.from(box.value).length;
                counter.textContent = 'Character count: ' + n + '/' + counter.dataset.limit;
                counter.classList.toggle('over', n > Number(counter.dataset.limit));
            });
        });
    </script>
</body>
</html>"#;

/// Escapes HTML special characters to prevent XSS attacks.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn counter_html(id: &str, count: usize) -> String {
    let class = if count > TWEET_CHAR_LIMIT {
        "count over"
    } else {
        "count"
    };
    format!(
        "<div class=\"{}\" id=\"{}\" data-limit=\"{}\">Character count: {}/{}</div>\n",
        class, id, TWEET_CHAR_LIMIT, count, TWEET_CHAR_LIMIT
    )
}

/// Renders the whole page for a session.
///
/// `notice` is passed separately because the handler takes it out of the session
/// so that it is shown only once. Every `<textarea>` opening tag is followed by a
/// newline; the HTML parser strips exactly one there, leaving leading line breaks
/// of the content intact.
pub fn render_page(session: &Session, notice: Option<&Notice>) -> String {
    let mut html = String::from(PAGE_HEAD);

    if let Some(notice) = notice {
        let class = match notice.kind {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        };
        html.push_str(&format!(
            "        <div class=\"notice {}\">{}</div>\n",
            class,
            html_escape(&notice.message)
        ));
    }

    html.push_str(&format!(
        r#"        <form method="post" action="/refine">
            <label for="text">Enter your text:</label>
            <textarea id="text" name="text">
{}</textarea>
"#,
        html_escape(session.input())
    ));
    if session.is_awaiting_first_refinement() {
        html.push_str(
            "            <div class=\"actions\"><button type=\"submit\">Refine</button></div>\n",
        );
    }
    html.push_str("        </form>\n");

    let active = session.active_index();
    for (i, draft) in session.drafts().iter().enumerate() {
        let text = session.edited_text(i).unwrap_or_else(|| draft.content().trim());
        let count = session
            .char_count(i)
            .unwrap_or_else(|| draft.content().trim().chars().count());
        let counter_id = format!("count-{}", i);

        html.push_str(&format!(
            "        <h2>Refined Tweet {}:</h2>\n",
            draft.ordinal()
        ));

        if Some(i) != active {
            html.push_str(&format!(
                "        <textarea readonly>\n{}</textarea>\n        {}",
                html_escape(text),
                counter_html(&counter_id, count)
            ));
            continue;
        }

        html.push_str(&format!(
            r#"        <form method="post" action="/drafts/{i}/refine">
            <label for="draft-{i}">Edit refined tweet:</label>
            <textarea id="draft-{i}" name="text" data-counter="{counter_id}">
{text}</textarea>
            {counter}            <label for="instructions-{i}">Additional refinement instructions (optional):</label>
            <input type="text" id="instructions-{i}" name="instructions" value="{instructions}">
            <div class="actions">
                <button type="submit">Refine Again</button>
                <button type="submit" formaction="/drafts/{i}/approve">Approve and Post</button>
                <button type="submit" formaction="/drafts/{i}/edit">Save Edit</button>
            </div>
        </form>
"#,
            i = i,
            counter_id = counter_id,
            text = html_escape(text),
            counter = counter_html(&counter_id, count),
            instructions = html_escape(session.instructions()),
        ));
    }

    html.push_str(PAGE_TAIL);
    html
}
