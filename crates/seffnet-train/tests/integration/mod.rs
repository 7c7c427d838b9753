mod evaluate;
mod optimize;
