//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Friendly Agent Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Secrets are better kept in the environment or a .env file:
#   AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_VERSION,
#   AZURE_OPENAI_DEPLOYMENT_NAME, OPENAI_API_KEY, OPENAI_BASE_URL

[gateway]
# provider = "azure"             # azure, openai
# endpoint = "https://my-resource.openai.azure.com"
# api_key = ""
# deployment = "gpt-4o"          # deployment name (azure) or model id (openai)
# api_version = "2024-05-01-preview"
# max_tokens = 1024
# temperature = 0.7              # 0.0-2.0
# request_timeout = 120          # 1-600 seconds
# connect_timeout = 10           # 1-120 seconds

[agent]
# name = "Friendly Agent"
# system_prompt = "You are a friendly and helpful assistant."
# greeting = "Hello! I'm your friendly assistant. How can I help you today?"
# farewell = "Goodbye! Have a great day!"
# context_window = 0             # recent entries sent per request, 0 = all

[web]
# host = "0.0.0.0"
# port = 8000
# idle_timeout = 1800            # 60-86400 seconds
# reap_interval = 60             # 1-3600 seconds

[logging]
# level = "INFO"                 # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
