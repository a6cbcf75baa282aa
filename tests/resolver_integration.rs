//! Integration tests for provider resolution.
//!
//! Every provider is pointed at a wiremock server through `ProviderEndpoints`,
//! and the full dispatcher flow is exercised through the public API.

use linkmeta_core::{Dispatcher, ProviderType, ResolveError, ResolverConfig};
use serde_json::json;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::config_for_mock;
use support::socket_guard::start_mock_server_or_skip;

fn dispatcher(config: &ResolverConfig) -> Dispatcher {
    Dispatcher::new(config).unwrap()
}

fn youtube_config(server: &MockServer) -> ResolverConfig {
    ResolverConfig {
        youtube_api_key: Some("yt-key".to_string()),
        ..config_for_mock(&server.uri())
    }
}

fn steam_config(server: &MockServer) -> ResolverConfig {
    ResolverConfig {
        steam_api_key: Some("steam-key".to_string()),
        ..config_for_mock(&server.uri())
    }
}

fn channel_details(id: &str, title: &str) -> serde_json::Value {
    json!({
        "items": [{
            "id": id,
            "snippet": {
                "title": title,
                "description": "Videos about the Rust programming language.",
                "customUrl": "@rustlang",
                "thumbnails": {"high": {"url": "https://yt3.test/avatar.jpg"}}
            },
            "statistics": {
                "subscriberCount": "1260",
                "videoCount": "42",
                "viewCount": "99000",
                "hiddenSubscriberCount": false
            }
        }]
    })
}

// ==================== Generic fallback ====================

#[tokio::test]
async fn test_unrecognized_link_is_generic_without_network() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://example.com/page")
        .await
        .unwrap();

    assert_eq!(metadata.provider_type, ProviderType::Other);
    assert_eq!(metadata.title, "https://example.com/page");
    assert_eq!(metadata.description.as_deref(), Some("External Link"));
    assert!(metadata.image_url.is_none());
    assert!(metadata.extra.is_empty());
}

// ==================== GitHub ====================

#[tokio::test]
async fn test_github_repository_resolves() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/repos/octocat/Hello-World"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "octocat/Hello-World",
            "description": "My first repository on GitHub!",
            "stargazers_count": 42,
            "forks_count": 7,
            "language": "Rust",
            "html_url": "https://github.com/octocat/Hello-World",
            "owner": {"login": "octocat", "avatar_url": "https://avatars.test/u/583231"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://github.com/octocat/Hello-World")
        .await
        .unwrap();

    assert_eq!(metadata.provider_type, ProviderType::Github);
    assert_eq!(metadata.title, "octocat/Hello-World");
    assert_eq!(
        metadata.description.as_deref(),
        Some("My first repository on GitHub!")
    );
    assert_eq!(metadata.account_subtype.as_deref(), Some("repository"));
    assert_eq!(metadata.extra["stars"], 42);
    assert_eq!(metadata.extra["forks"], 7);
    assert_eq!(metadata.extra["language"], "Rust");
}

#[tokio::test]
async fn test_github_token_sent_as_bearer() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "name": "The Octocat",
            "bio": null,
            "avatar_url": "https://avatars.test/u/583231",
            "followers": 20,
            "public_repos": 8,
            "type": "User"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ResolverConfig {
        github_token: Some("ghp_test".to_string()),
        ..config_for_mock(&mock_server.uri())
    };
    let metadata = dispatcher(&config)
        .resolve("github.com/octocat")
        .await
        .unwrap();

    assert_eq!(metadata.title, "The Octocat");
    assert_eq!(metadata.account_subtype.as_deref(), Some("user"));
    assert_eq!(metadata.extra["followers"], 20);
}

#[tokio::test]
async fn test_github_missing_repository_is_upstream_404() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/repos/octocat/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&mock_server)
        .await;

    let error = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://github.com/octocat/missing")
        .await
        .unwrap_err();

    match error {
        ResolveError::Upstream {
            provider,
            status,
            message,
            ..
        } => {
            assert_eq!(provider, ProviderType::Github);
            assert_eq!(status, Some(404));
            assert_eq!(message, "Not Found");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

// ==================== Discord ====================

#[tokio::test]
async fn test_discord_invite_resolves_with_counts() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/invites/rust-lang"))
        .and(query_param("with_counts", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "rust-lang",
            "guild": {"id": "273534239310479360", "name": "Rust Programming", "icon": "abc"},
            "approximate_member_count": 51234,
            "approximate_presence_count": 9876
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://discord.gg/rust-lang")
        .await
        .unwrap();

    assert_eq!(metadata.provider_type, ProviderType::Discord);
    assert_eq!(metadata.title, "Rust Programming");
    assert_eq!(
        metadata.description.as_deref(),
        Some("51,234 members • 9,876 online")
    );
    assert_eq!(
        metadata.image_url,
        Some(format!(
            "{}/icons/273534239310479360/abc.png",
            mock_server.uri()
        ))
    );
    assert_eq!(metadata.extra["server_id"], "273534239310479360");
}

#[tokio::test]
async fn test_discord_unknown_invite_is_upstream_error() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/invites/expired"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"message": "Unknown Invite", "code": 10006})),
        )
        .mount(&mock_server)
        .await;

    let error = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://discord.com/invite/expired")
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "upstream_error");
    assert!(error.to_string().contains("Unknown Invite"));
}

// ==================== YouTube ====================

#[tokio::test]
async fn test_youtube_handle_prefers_exact_match() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rustlang"))
        .and(query_param("type", "channel"))
        .and(query_param("key", "yt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": {"channelId": "UC-first"}, "snippet": {"title": "Rust Clips"}},
                {"id": {"channelId": "UC-exact"}, "snippet": {"title": "RustLang"}}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "UC-exact"))
        .and(query_param("part", "snippet,statistics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(channel_details("UC-exact", "RustLang")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&youtube_config(&mock_server))
        .resolve("https://www.youtube.com/@rustlang")
        .await
        .unwrap();

    assert_eq!(metadata.provider_type, ProviderType::Youtube);
    assert_eq!(metadata.title, "RustLang");
    assert_eq!(metadata.extra["channel_id"], "UC-exact");
    assert_eq!(
        metadata.description.as_deref(),
        Some("1.3K subscribers • 42 videos\nVideos about the Rust programming language.")
    );
    assert_eq!(
        metadata.image_url.as_deref(),
        Some("https://yt3.test/avatar.jpg")
    );
}

#[tokio::test]
async fn test_youtube_without_exact_match_takes_first_result() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": {"channelId": "UC-first"}, "snippet": {"title": "Somebody Else"}},
                {"id": {"channelId": "UC-second"}, "snippet": {"title": "Another One"}}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "UC-first"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(channel_details("UC-first", "Somebody Else")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&youtube_config(&mock_server))
        .resolve("https://youtube.com/c/nomatch")
        .await
        .unwrap();

    assert_eq!(metadata.title, "Somebody Else");
}

#[tokio::test]
async fn test_youtube_tries_every_variant_then_not_found() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    // "ghost.town" yields: ghost.town, @ghost.town, ghosttown
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let error = dispatcher(&youtube_config(&mock_server))
        .resolve("https://www.youtube.com/user/ghost.town")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResolveError::NotFound { provider: ProviderType::Youtube, ref query, .. } if query == "ghost.town"
    ));
}

#[tokio::test]
async fn test_youtube_searches_four_distinct_variants_in_order() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    for variant in ["ghost.town-x", "@ghost.town-x", "ghosttownx", "ghosttown-x"] {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", variant))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let error = dispatcher(&youtube_config(&mock_server))
        .resolve("https://www.youtube.com/@ghost.town-x")
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "not_found");
    let requests = mock_server.received_requests().await.unwrap();
    let searched: Vec<String> = requests
        .iter()
        .filter(|request| request.url.path() == "/search")
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "q")
                .map(|(_, value)| value.into_owned())
        })
        .collect();
    assert_eq!(
        searched,
        ["ghost.town-x", "@ghost.town-x", "ghosttownx", "ghosttown-x"]
    );
}

#[tokio::test]
async fn test_youtube_channel_id_skips_search() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "UCabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_details("UCabc", "Direct")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&youtube_config(&mock_server))
        .resolve("https://www.youtube.com/channel/UCabc")
        .await
        .unwrap();
    assert_eq!(metadata.title, "Direct");
}

#[tokio::test]
async fn test_youtube_without_key_is_not_configured() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let error = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://www.youtube.com/@rustlang")
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "provider_not_configured");
    assert!(error.to_string().contains("youtube_api_key"));
}

// ==================== Spotify ====================

#[tokio::test]
async fn test_spotify_track_splits_title() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/oembed"))
        .and(query_param(
            "url",
            "https://open.spotify.com/track/6GyFP1nfCDB8lbD2bG0Hq9",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Midnight City - M83",
            "thumbnail_url": "https://i.scdn.test/cover.jpg",
            "html": "<iframe src=\"https://open.spotify.com/embed/track/6GyFP1nfCDB8lbD2bG0Hq9\"></iframe>",
            "type": "rich"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&config_for_mock(&mock_server.uri()))
        .resolve("https://open.spotify.com/intl-fr/track/6GyFP1nfCDB8lbD2bG0Hq9?si=xyz")
        .await
        .unwrap();

    assert_eq!(metadata.provider_type, ProviderType::Spotify);
    assert_eq!(metadata.title, "Midnight City");
    assert_eq!(metadata.extra["artist"], "M83");
    assert_eq!(metadata.extra["track_name"], "Midnight City");
    assert_eq!(metadata.extra["album"], "");
    assert_eq!(
        metadata.image_url.as_deref(),
        Some("https://i.scdn.test/cover.jpg")
    );
}

// ==================== Steam ====================

#[tokio::test]
async fn test_steam_vanity_resolves_then_summarizes() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ISteamUser/ResolveVanityURL/v0001/"))
        .and(query_param("vanityurl", "gabelogannewell"))
        .and(query_param("key", "steam-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"steamid": "76561197960287930", "success": 1}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ISteamUser/GetPlayerSummaries/v0002/"))
        .and(query_param("steamids", "76561197960287930"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"players": [{
                "steamid": "76561197960287930",
                "personaname": "Rabscuttle",
                "realname": "Gabe Newell",
                "avatarfull": "https://avatars.steam.test/full.jpg",
                "profileurl": "https://steamcommunity.com/id/gabelogannewell/",
                "personastate": 0
            }]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = dispatcher(&steam_config(&mock_server))
        .resolve("https://steamcommunity.com/id/gabelogannewell")
        .await
        .unwrap();

    assert_eq!(metadata.provider_type, ProviderType::Steam);
    assert_eq!(metadata.title, "Rabscuttle");
    assert_eq!(metadata.description.as_deref(), Some("Profile · Gabe Newell"));
    assert_eq!(metadata.extra["steam_id"], "76561197960287930");
    assert_eq!(metadata.extra["persona_state"], "offline");
}

#[tokio::test]
async fn test_steam_unknown_vanity_is_not_found() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ISteamUser/ResolveVanityURL/v0001/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"success": 42, "message": "No match"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ISteamUser/GetPlayerSummaries/v0002/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let error = dispatcher(&steam_config(&mock_server))
        .resolve("https://steamcommunity.com/id/nobody-here")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), "not_found");
}

#[tokio::test]
async fn test_steam_empty_player_list_is_not_found() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ISteamUser/GetPlayerSummaries/v0002/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": {"players": []}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = dispatcher(&steam_config(&mock_server))
        .resolve("https://steamcommunity.com/profiles/76561197960287930")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), "not_found");
}

#[tokio::test]
async fn test_steam_without_key_is_not_configured() {
    let error = Dispatcher::new(&ResolverConfig::default())
        .unwrap()
        .resolve("https://steamcommunity.com/profiles/76561197960287930")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), "provider_not_configured");
}
