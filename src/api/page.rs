//! Random song page
//!
//! Composes Track Source -> Affinity Classifier -> Video Resolver into the
//! rendered page. A catalog failure surfaces as a failed render; a video
//! resolution failure only downgrades the embed to "no playable video".

use crate::affinity::ChaserStatus;
use crate::catalog::Track;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{extract::State, response::Html};
use rand::seq::SliceRandom;
use tracing::info;

/// GET / - pick a random candidate, classify it, resolve a video, render
pub async fn index_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let candidates = state.catalog.fetch_candidates().await?;

    // RNG is scoped so the handler future stays Send
    let track = {
        let mut rng = rand::thread_rng();
        candidates.choose(&mut rng).cloned()
    }
    .ok_or_else(|| ApiError::Upstream("catalog returned no candidates".to_string()))?;

    let status = state.cache.classify(&track);
    let (video_id, audio_available) = state
        .resolver
        .resolve(&track.title, track.primary_artist())
        .await;

    info!(
        song = %track.title,
        artist = %track.primary_artist(),
        chaser_status = %status,
        audio_available,
        "page rendered"
    );

    Ok(Html(render_page(
        &track,
        status,
        video_id.as_deref(),
        audio_available,
    )))
}

/// Minimal HTML-escape for interpolated catalog strings
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_page(
    track: &Track,
    status: ChaserStatus,
    video_id: Option<&str>,
    audio_available: bool,
) -> String {
    let song_name = escape(&track.title);
    let artist_name = escape(track.primary_artist());
    let all_artists = escape(&track.artist_list.join(", "));
    let album_name = escape(&track.album_name);

    let cover = match &track.cover_image_url {
        Some(url) => format!(
            r#"<img class="cover" src="{}" alt="Album cover for {}">"#,
            escape(url),
            album_name
        ),
        None => r#"<div class="cover cover-missing">no cover</div>"#.to_string(),
    };

    let status_class = match status {
        ChaserStatus::Yes => "status-yes",
        ChaserStatus::Adjacent => "status-adjacent",
        ChaserStatus::No => "status-no",
    };

    let player = match (video_id, audio_available) {
        (Some(id), true) => format!(
            r#"<iframe class="player" src="https://www.youtube.com/embed/{}?autoplay=0"
                title="{} - {}" frameborder="0" allow="encrypted-media" allowfullscreen></iframe>"#,
            escape(id),
            song_name,
            artist_name
        ),
        _ => r#"<p class="no-player">No playable video found for this one.</p>"#.to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>chaser</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
            display: flex;
            flex-direction: column;
            align-items: center;
            padding: 30px 20px;
        }}
        h1 {{
            color: #ff4a9e;
            font-size: 26px;
            margin-bottom: 20px;
        }}
        .card {{
            background-color: #2a2a2a;
            border: 1px solid #3a3a3a;
            border-radius: 8px;
            padding: 24px;
            max-width: 560px;
            width: 100%;
            text-align: center;
        }}
        .cover {{
            width: 280px;
            height: 280px;
            object-fit: cover;
            border-radius: 6px;
            margin-bottom: 16px;
        }}
        .cover-missing {{
            display: flex;
            align-items: center;
            justify-content: center;
            background: #3a3a3a;
            color: #888;
            margin: 0 auto 16px;
        }}
        .song {{
            font-size: 22px;
            font-weight: 600;
        }}
        .artists {{
            color: #888;
            margin-bottom: 12px;
        }}
        .status {{
            display: inline-block;
            padding: 4px 12px;
            border-radius: 12px;
            font-weight: 600;
            font-size: 13px;
            margin-bottom: 16px;
        }}
        .status-yes {{ background: #ff4a9e; color: #fff; }}
        .status-adjacent {{ background: #f59e0b; color: #fff; }}
        .status-no {{ background: #3a3a3a; color: #aaa; }}
        .player {{
            width: 100%;
            height: 280px;
            border-radius: 6px;
            margin-bottom: 16px;
        }}
        .no-player {{
            color: #888;
            margin-bottom: 16px;
        }}
        canvas {{
            width: 100%;
            height: 80px;
            background: #1f1f1f;
            border-radius: 6px;
        }}
        .reroll {{
            display: inline-block;
            margin-top: 16px;
            padding: 10px 20px;
            background: #ff4a9e;
            color: white;
            text-decoration: none;
            border-radius: 4px;
            font-weight: 600;
        }}
    </style>
</head>
<body>
    <h1>are you a chaser?</h1>
    <div class="card">
        {cover}
        <div class="song">{song_name}</div>
        <div class="artists">{all_artists} &mdash; {album_name}</div>
        <div><span class="status {status_class}">{status}</span></div>
        {player}
        <canvas id="levels" width="520" height="80"></canvas>
        <div><a class="reroll" href="/">another one</a></div>
    </div>
    <script>
        const canvas = document.getElementById('levels');
        const ctx = canvas.getContext('2d');
        const source = new EventSource('/visualization');
        source.addEventListener('sample', (e) => {{
            const s = JSON.parse(e.data);
            ctx.clearRect(0, 0, canvas.width, canvas.height);
            ctx.fillStyle = s.fallback ? '#555' : '#ff4a9e';
            const half = canvas.width / 2 - 4;
            ctx.fillRect(half - half * s.left / 100, 20, half * s.left / 100, 40);
            ctx.fillRect(half + 8, 20, half * s.right / 100, 40);
        }});
    </script>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            title: "M3TAL <3".to_string(),
            artist_list: vec!["femtanyl".to_string(), "guest".to_string()],
            album_name: "CHASER".to_string(),
            cover_image_url: Some("https://img.example/cover.jpg".to_string()),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_render_escapes_title() {
        let html = render_page(&track(), ChaserStatus::Yes, None, false);
        assert!(html.contains("M3TAL &lt;3"));
        assert!(!html.contains("M3TAL <3"));
    }

    #[test]
    fn test_render_embeds_player_only_when_available() {
        let with = render_page(&track(), ChaserStatus::Yes, Some("dQw4w9WgXcQ"), true);
        assert!(with.contains("youtube.com/embed/dQw4w9WgXcQ"));

        // No embed when a video id exists but the heuristic says unplayable
        let without = render_page(&track(), ChaserStatus::No, Some("dQw4w9WgXcQ"), false);
        assert!(!without.contains("youtube.com/embed"));
        assert!(without.contains("No playable video"));
    }

    #[test]
    fn test_render_status_badge() {
        let html = render_page(&track(), ChaserStatus::Adjacent, None, false);
        assert!(html.contains("status-adjacent"));
        assert!(html.contains("Chaser Adjacent"));
    }
}
