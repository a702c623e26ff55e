mod rs256;
