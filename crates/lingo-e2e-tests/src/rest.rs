use anyhow::Result;
use lingo_dal::post::PostDto;
use reqwest::Url;
use serde_json::json;

/// Post with the same title and description text in given languages.
pub fn post_payload(texts: &[(&str, &str)]) -> serde_json::Value {
    let items: Vec<_> = texts
        .iter()
        .map(|(code, text)| json!({"languageCode": code, "text": text}))
        .collect();
    json!({"title": items, "description": items})
}

pub async fn create_post(
    client: &reqwest::Client,
    base_url: &Url,
    texts: &[(&str, &str)],
) -> Result<PostDto> {
    let api_url = base_url.join("api/post")?;
    let response = client
        .post(api_url)
        .json(&post_payload(texts))
        .send()
        .await?;
    anyhow::ensure!(
        response.status().as_u16() == 201,
        "Unexpected status {}",
        response.status()
    );
    Ok(response.json().await?)
}
