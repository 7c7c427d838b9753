mod split;
mod subgraph;
