//! Root page handler

use axum::response::{Html, IntoResponse};

/// GET /
///
/// Every section is rendered hidden; `comprank.js` shows the one matching
/// the persisted job state.
pub async fn root_page() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Deal Multiple Company Similarity Analysis</title>
    <link rel="stylesheet" href="/static/comprank.css">
</head>
<body>
    <header>
        <h1>Deal Multiple Company Similarity Analysis</h1>
        <span class="version">v{version}</span>
    </header>
    <main class="container">
        <section id="rating-scale">
            <h2>Rating Scale Explanation</h2>
            <table class="scale">
                <thead><tr><th>Rating</th><th>Description</th></tr></thead>
                <tbody>
                    <tr><td>1&ndash;2</td><td>Very similar business models (strong comparables)</td></tr>
                    <tr><td>3&ndash;4</td><td>Similar with some differences</td></tr>
                    <tr><td>5&ndash;6</td><td>Moderately similar</td></tr>
                    <tr><td>7&ndash;8</td><td>Different business models</td></tr>
                    <tr><td>9&ndash;10</td><td>Completely unrelated</td></tr>
                </tbody>
            </table>
        </section>

        <section id="login-stage" hidden>
            <form id="login-form">
                <label for="password">Password</label>
                <input type="password" id="password" autocomplete="current-password" required>
                <button type="submit">Log in</button>
            </form>
        </section>

        <section id="target-stage" hidden>
            <form id="target-form">
                <label for="target">Describe the target company.</label>
                <textarea id="target" rows="6"></textarea>
                <button type="submit">Submit Description</button>
            </form>
        </section>

        <section id="upload-stage" hidden>
            <p><strong>Target Description:</strong> <span class="target-preview"></span></p>
            <form id="upload-form">
                <label for="upload">Upload the deal export (Excel or CSV)</label>
                <input type="file" id="upload" accept=".xlsx,.csv,application/vnd.openxmlformats-officedocument.spreadsheetml.sheet,text/csv" required>
                <button type="submit">Start Analysis</button>
            </form>
        </section>

        <section id="progress-stage" hidden>
            <p><strong>Target Description:</strong> <span class="target-preview"></span></p>
            <div class="progress"><div id="progress-bar"></div></div>
            <p id="progress-text"></p>
        </section>

        <section id="results-stage" hidden>
            <h2>Results</h2>
            <p id="strong-matches"></p>
            <div class="actions">
                <a id="download" class="button" href="/job/export" download>Download Results CSV</a>
            </div>
            <div class="table-wrap"><table id="results-table"></table></div>
        </section>

        <section id="failed-stage" hidden>
            <h2>Analysis stopped</h2>
            <p>The batch could not continue. Start over to run it again.</p>
        </section>

        <ul id="row-errors"></ul>
        <p id="message" class="error"></p>

        <div class="actions">
            <button id="reset" type="button" hidden>Start Over</button>
        </div>
    </main>
    <script src="/static/comprank.js"></script>
</body>
</html>
"#
    );

    Html(html)
}
