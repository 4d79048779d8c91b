use wiremock::matchers::{any, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{spawn_app, spawn_app_with, valid_event_body, MESSAGES_PATH};
use form_relay::configuration::AckSettings;

#[tokio::test]
async fn a_valid_registration_relays_a_notification() {
    let app = spawn_app().await;
    app.mount_token_grant().await;
    app.mount_message_accept(1).await;

    let response = app.post_event(valid_event_body()).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"success": true}));

    let messages = app.sent_messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0]["subject"],
        "Event Registration: Broadcast Expo 2026"
    );
    let content = messages[0]["content"].as_str().unwrap();
    assert!(content.contains("Event: Broadcast Expo 2026"));
    assert!(content.contains("Designation: Engineer"));
}

#[tokio::test]
async fn event_routing_falls_back_to_the_contact_addresses() {
    let app = spawn_app().await;
    app.mount_token_grant().await;
    app.mount_message_accept(1).await;

    app.post_event(valid_event_body()).await;

    let messages = app.sent_messages().await;
    assert_eq!(messages[0]["fromAddress"], "relay@example.com");
    assert_eq!(messages[0]["toAddress"], "inbox@example.com");
}

#[tokio::test]
async fn event_specific_routing_wins_over_the_fallback() {
    let app = spawn_app_with(|config| {
        config.mail.event.from_address = Some("events@example.com".into());
        config.mail.event.to_address = Some("registrations@example.com".into());
        config.mail.event.cc_address = Some("sales@example.com".into());
    })
    .await;
    app.mount_token_grant().await;
    app.mount_message_accept(1).await;

    app.post_event(valid_event_body()).await;

    let messages = app.sent_messages().await;
    assert_eq!(messages[0]["fromAddress"], "events@example.com");
    assert_eq!(messages[0]["toAddress"], "registrations@example.com");
    assert_eq!(messages[0]["ccAddress"], "sales@example.com");
}

#[tokio::test]
async fn an_enabled_event_acknowledgement_substitutes_the_event_title() {
    let app = spawn_app_with(|config| {
        config.mail.event.acknowledgement = Some(AckSettings {
            enabled: true,
            from_address: "events@example.com".into(),
            subject: "Registration received - {{event_title}}".into(),
        });
    })
    .await;
    app.mount_token_grant().await;
    app.mount_message_accept(2).await;

    let response = app.post_event(valid_event_body()).await;

    assert_eq!(200, response.status().as_u16());
    let messages = app.sent_messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["toAddress"], "jane@example.com");
    assert_eq!(
        messages[1]["subject"],
        "Registration received - Broadcast Expo 2026"
    );
}

#[tokio::test]
async fn an_absent_event_acknowledgement_falls_back_to_the_contact_settings() {
    let app = spawn_app_with(|config| {
        config.mail.event.acknowledgement = None;
        config.mail.contact.acknowledgement.subject = "We got your {{event_title}} booking".into();
    })
    .await;
    app.mount_token_grant().await;
    app.mount_message_accept(2).await;

    app.post_event(valid_event_body()).await;

    let messages = app.sent_messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[1]["subject"],
        "We got your Broadcast Expo 2026 booking"
    );
}

#[tokio::test]
async fn invalid_registrations_are_rejected_with_a_400() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mail_server)
        .await;

    let long_event_type = format!(
        "event_title=Broadcast%20Expo&event_type={}&name=Jane&email=jane%40example.com",
        "t".repeat(81)
    );
    let test_cases = vec![
        (
            "name=Jane&email=jane%40example.com".to_string(),
            "Please select a valid event.",
        ),
        (
            "event_title=Ex&name=Jane&email=jane%40example.com".to_string(),
            "Please select a valid event.",
        ),
        (
            "event_title=Broadcast%20Expo&name=Jane&email=broken".to_string(),
            "Please enter a valid email address.",
        ),
        (long_event_type, "Event type is too long."),
    ];

    for (body, expected_message) in test_cases {
        let response = app.post_event(&body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not reject the payload `{}`.",
            body
        );
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["message"], expected_message);
    }
}

#[tokio::test]
async fn the_message_field_is_optional_for_registrations() {
    let app = spawn_app().await;
    app.mount_token_grant().await;
    app.mount_message_accept(1).await;

    let response = app
        .post_event("event_title=Broadcast%20Expo&name=Jane&email=jane%40example.com")
        .await;

    assert_eq!(200, response.status().as_u16());
    let messages = app.sent_messages().await;
    let content = messages[0]["content"].as_str().unwrap();
    assert!(content.contains("Special Requirements / Questions:\nN/A"));
}

#[tokio::test]
async fn a_tripped_honeypot_is_accepted_without_any_provider_call() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mail_server)
        .await;

    let response = app
        .post_event("event_title=Expo&_honey=filled&name=Jane&email=jane%40example.com")
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"success": true}));
}

#[tokio::test]
async fn non_post_methods_are_answered_with_405() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(&format!("{}/event-submit", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(405, response.status().as_u16());
}

#[tokio::test]
async fn an_upstream_failure_names_the_registration_in_the_message() {
    let app = spawn_app().await;
    Mock::given(path(crate::helpers::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.mail_server)
        .await;

    let response = app.post_event(valid_event_body()).await;

    assert_eq!(502, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Unable to submit your registration right now."
    );
}

#[tokio::test]
async fn missing_event_credentials_short_circuit_with_500() {
    let app = spawn_app_with(|config| {
        config.mail.account_id = "REPLACE_WITH_ACCOUNT_ID".into();
    })
    .await;

    let response = app.post_event(valid_event_body()).await;

    assert_eq!(500, response.status().as_u16());
}
