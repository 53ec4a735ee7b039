//! Request commands: raw endpoint access and booking actions

use anyhow::{Context, bail};
use hallbook::{ApprovalFilter, RequestOptions, Resource};
use reqwest::Method;
use serde_json::Value;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::output::json::print_json;

/// GET an endpoint and print the result
pub async fn get(opts: &GlobalOptions, endpoint: &str) -> anyhow::Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = ctx.api.get(endpoint).await?;
    print_json(endpoint, &result)
}

/// Send a request with an arbitrary method and optional JSON body
pub async fn send(
    opts: &GlobalOptions,
    method: &str,
    endpoint: &str,
    data: Option<&str>,
) -> anyhow::Result<()> {
    let method = parse_method(method)?;
    let mut options = RequestOptions::new(method);
    if let Some(data) = data {
        let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        options = options.body(body);
    }

    let ctx = CommandContext::new(opts)?;
    let result = ctx.api.request(endpoint, options).await?;
    print_json(endpoint, &result)
}

pub async fn list(opts: &GlobalOptions, resource: Resource) -> anyhow::Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = ctx.api.list(resource).await?;
    print_json(resource.list_endpoint(), &result)
}

pub async fn approvals(opts: &GlobalOptions, filter: ApprovalFilter) -> anyhow::Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = ctx.api.approvals(filter).await?;
    print_json(filter.endpoint().as_str(), &result)
}

pub async fn approve(opts: &GlobalOptions, booking_id: &str) -> anyhow::Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = ctx
        .api
        .approve_booking(booking_id)
        .await
        .with_context(|| format!("Failed to approve booking {}", booking_id))?;
    print_json(&format!("api/booking/{}/approve", booking_id), &result)
}

pub async fn reject(
    opts: &GlobalOptions,
    booking_id: &str,
    reason: Option<&str>,
) -> anyhow::Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = ctx
        .api
        .reject_booking(booking_id, reason)
        .await
        .with_context(|| format!("Failed to reject booking {}", booking_id))?;
    print_json(&format!("api/booking/{}/reject", booking_id), &result)
}

pub async fn forward(opts: &GlobalOptions, booking_id: &str) -> anyhow::Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = ctx
        .api
        .forward_booking(booking_id)
        .await
        .with_context(|| format!("Failed to forward booking {}", booking_id))?;
    print_json(&format!("api/booking/{}/forward", booking_id), &result)
}

fn parse_method(raw: &str) -> anyhow::Result<Method> {
    let method = match raw.to_uppercase().as_str() {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "PATCH" => Method::PATCH,
        "DELETE" => Method::DELETE,
        other => bail!("Unsupported method '{}'", other),
    };
    Ok(method)
}
