// handlers/mod.rs - Two-tier handler layout
//
// Public (no identity, signature-checked webhook) → Protected (identity
// middleware injects an AuthContext; each operation runs its own gate)
pub mod protected; // /api/*
pub mod public; // /, /health, /get-user-id, /clerk-webhook
