mod common;

use std::sync::atomic::Ordering;

use common::*;
use reqwest::{Client, StatusCode};
use sporlweb::spotify::{ApiError, SpotifyClient, TimeRange, client::MAX_RETRIES};

async fn client() -> (SpotifyClient, std::sync::Arc<FakeSpotify>) {
    let (fake, base) = spawn_fake_spotify().await;
    fake.issue("access-ok", "refresh-ok").await;
    (SpotifyClient::new(Client::new(), format!("{}/v1/", base)), fake)
}

#[tokio::test]
async fn test_current_user_playlists_skips_unavailable_entries() {
    let (client, _) = client().await;

    let page = client.current_user_playlists("access-ok", 50, 0).await.unwrap();
    // the unavailable (null) entry is dropped
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, Some(3));
    assert_eq!(page.items[0].name, "Road Trip");
    assert_eq!(
        page.items[0].external_urls.spotify.as_deref(),
        Some("https://open.spotify.com/playlist/pl1")
    );
}

#[tokio::test]
async fn test_current_user_top_tracks_honours_limit() {
    let (client, _) = client().await;

    let page = client
        .current_user_top_tracks("access-ok", 3, TimeRange::ShortTerm)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[2].first_artist(), "Artist 3");
}

#[tokio::test]
async fn test_invalid_token_maps_to_status_error() {
    let (client, _) = client().await;

    let err = client
        .current_user_playlists("nope", 50, 0)
        .await
        .unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Invalid access token");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let (client, fake) = client().await;
    fake.fail_api(StatusCode::TOO_MANY_REQUESTS, Some(12)).await;

    let err = client
        .current_user_top_tracks("access-ok", 5, TimeRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RateLimited { retry_after: Some(12) }));
    assert_eq!(fake.api_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bad_gateway_is_retried_then_reported() {
    let (client, fake) = client().await;
    fake.fail_api(StatusCode::BAD_GATEWAY, None).await;

    let err = client
        .current_user_playlists("access-ok", 50, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::BAD_GATEWAY));
    assert_eq!(fake.api_requests.load(Ordering::SeqCst), MAX_RETRIES + 1);
}

#[test]
fn test_time_range_values() {
    assert_eq!(TimeRange::default(), TimeRange::MediumTerm);
    assert_eq!(TimeRange::ShortTerm.as_str(), "short_term");
    assert_eq!(TimeRange::LongTerm.as_str(), "long_term");
}
