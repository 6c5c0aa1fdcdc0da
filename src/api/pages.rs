//! HTML rendering for the handlers. All dynamic text goes through
//! [`escape_html`].

use axum::http::StatusCode;

use crate::{
    types::{PlaylistRow, TrackRow},
    utils::escape_html,
};

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
li{margin:.25rem 0}nav a{margin-right:1rem}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <nav><a href=\"/\">Home</a><a href=\"/get_playlists\">Playlists</a>\
         <a href=\"/get_top_tracks\">Top tracks</a><a href=\"/logout\">Log out</a></nav>\n\
         {body}\n</body>\n</html>\n",
        title = escape_html(title),
        style = STYLE,
    )
}

/// Landing page; with data it doubles as the results page.
///
/// # Arguments
///
/// * `playlists` - Playlists to list, each linked to its Spotify URL when
///   one is known. `None` omits the section.
/// * `top_tracks` - Top tracks as an ordered `name - artist` list. `None`
///   omits the section.
///
/// With neither section the page shows a short welcome text.
pub fn index(playlists: Option<&[PlaylistRow]>, top_tracks: Option<&[TrackRow]>) -> String {
    let mut body = String::from("<h1>Spotify account</h1>\n");

    if playlists.is_none() && top_tracks.is_none() {
        body.push_str("<p>You are signed in. Pick a page above to see your data.</p>\n");
    }

    if let Some(playlists) = playlists {
        body.push_str("<h2>Your playlists</h2>\n");
        if playlists.is_empty() {
            body.push_str("<p>No playlists found.</p>\n");
        } else {
            body.push_str("<ul>\n");
            for pl in playlists {
                if pl.url.is_empty() {
                    body.push_str(&format!("<li>{}</li>\n", escape_html(&pl.name)));
                } else {
                    body.push_str(&format!(
                        "<li><a href=\"{}\">{}</a></li>\n",
                        escape_html(&pl.url),
                        escape_html(&pl.name)
                    ));
                }
            }
            body.push_str("</ul>\n");
        }
    }

    if let Some(tracks) = top_tracks {
        body.push_str("<h2>Your top tracks</h2>\n");
        if tracks.is_empty() {
            body.push_str("<p>No top tracks yet.</p>\n");
        } else {
            body.push_str("<ol>\n");
            for track in tracks {
                body.push_str(&format!(
                    "<li>{} - {}</li>\n",
                    escape_html(&track.name),
                    escape_html(&track.artist)
                ));
            }
            body.push_str("</ol>\n");
        }
    }

    layout("Spotify account", &body)
}

/// Bare `name - artist` lines separated by `<br>`.
pub fn top_tracks_plain(tracks: &[TrackRow]) -> String {
    tracks
        .iter()
        .map(|t| format!("{} - {}", escape_html(&t.name), escape_html(&t.artist)))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Full HTML page for a failed request.
///
/// # Arguments
///
/// * `status` - Response status; its reason phrase becomes the heading
/// * `message` - Text for the visitor, escaped before rendering
///
/// # Example
///
/// ```
/// let html = error_page(StatusCode::BAD_REQUEST, "The sign-in callback did not include a code.");
/// ```
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Try again</a></p>",
        escape_html(status.canonical_reason().unwrap_or("Error")),
        escape_html(message)
    );
    layout("Error", &body)
}
