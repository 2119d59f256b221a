mod sessions;
mod tasks;
