/// Integration tests for the habit rules server

mod api_integration;
