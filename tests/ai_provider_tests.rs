use serde_json::json;

use lifeskills_lib::ai_provider::{
    build_request_body, extract_candidate_text, extract_places, parse_generation_response,
    ContentBackend, GeminiClient, GenerationRequest,
};
use lifeskills_lib::backend::geolocation::Coordinates;
use lifeskills_lib::config::GeminiConfig;
use lifeskills_lib::error::ContentError;

#[test]
fn test_parse_gemini_response_variants() {
    // plain string content
    let j = json!({ "candidates": [ { "content": "Gemini says hi" } ] });
    assert_eq!(extract_candidate_text(&j).as_deref(), Some("Gemini says hi"));

    // content.text
    let j2 = json!({ "candidates": [ { "content": { "text": "Direct text" } } ] });
    assert_eq!(extract_candidate_text(&j2).as_deref(), Some("Direct text"));

    // content.parts, concatenated
    let j3 = json!({
        "candidates": [ { "content": { "parts": [ { "text": "Hello, " }, { "text": "world" } ] } } ]
    });
    assert_eq!(extract_candidate_text(&j3).as_deref(), Some("Hello, world"));
}

#[test]
fn test_parse_gemini_response_without_text_is_empty() {
    let j = json!({ "candidates": [] });
    assert!(extract_candidate_text(&j).is_none());
    assert!(matches!(
        parse_generation_response(&j),
        Err(ContentError::EmptyResponse)
    ));

    let j2 = json!({ "candidates": [ { "content": { "parts": [] } } ] });
    assert!(extract_candidate_text(&j2).is_none());
}

#[test]
fn test_extract_grounding_places() {
    let j = json!({
        "candidates": [ {
            "content": { "parts": [ { "text": "Some places" } ] },
            "groundingMetadata": {
                "groundingChunks": [
                    { "maps": { "title": "Greenwood Park", "uri": "https://maps.example/greenwood" } },
                    { "web": { "title": "Not a place", "uri": "https://example.com" } },
                    { "maps": { "title": "Happy Paws Shelter" } }
                ]
            }
        } ]
    });
    let places = extract_places(&j);
    assert_eq!(places.len(), 2);
    assert_eq!(places[0].title, "Greenwood Park");
    assert_eq!(places[0].uri, "https://maps.example/greenwood");
    assert_eq!(places[1].uri, "");

    let parsed = parse_generation_response(&j).expect("parse");
    assert_eq!(parsed.text, "Some places");
    assert_eq!(parsed.places, places);
}

#[test]
fn test_request_body_shapes() {
    let plain = build_request_body(&GenerationRequest::text("gemini-2.5-flash", "hi"));
    assert_eq!(plain["contents"][0]["parts"][0]["text"], "hi");
    assert!(plain.get("generationConfig").is_none());
    assert!(plain.get("tools").is_none());

    let schema = json!({ "type": "ARRAY" });
    let structured = build_request_body(&GenerationRequest::json("m", "list", schema.clone()));
    assert_eq!(structured["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(structured["generationConfig"]["responseSchema"], schema);

    let at = Coordinates { lat: 37.7749, lng: -122.4194 };
    let grounded = build_request_body(&GenerationRequest::grounded("m", "near me", at));
    assert!(grounded["tools"][0].get("googleMaps").is_some());
    assert_eq!(
        grounded["toolConfig"]["retrievalConfig"]["latLng"]["latitude"],
        37.7749
    );
}

#[tokio::test]
async fn test_gemini_client_without_key_fails_fast() {
    let config = GeminiConfig {
        api_key: None,
        ..GeminiConfig::default()
    };
    let client = GeminiClient::new(&config).expect("client");
    let err = client
        .generate(GenerationRequest::text("gemini-2.5-flash", "hello"))
        .await
        .expect_err("no key");
    assert!(matches!(err, ContentError::MissingApiKey));
}
