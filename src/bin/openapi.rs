use anyhow::Result;

// Print the OpenAPI document so it can be published without starting the server.
fn main() -> Result<()> {
    let spec = escolar::api::openapi();
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}
